use crate::config::ComplianceParameters;
use crate::draws::UniformDraw;
use crate::events::EventRecord;
use crate::snapshot::DiseaseSnapshot;
use crate::state::ScreeningState;
use crate::types::{AgentId, Step};

/// Screening bookkeeping for every agent, stored column-wise and indexed by
/// [`AgentId`]. The screening core is the only writer of `state` and
/// `last_screen_age`; compliance flags are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningRecords {
    pub state: Vec<ScreeningState>,
    /// Age at the last screening visit; `None` until the first one.
    pub last_screen_age: Vec<Option<f64>>,
    pub compliant_routine: Vec<bool>,
    pub compliant_surveillance: Vec<bool>,
}

impl ScreeningRecords {
    /// Every agent starts ROUTINE, unscreened and compliant.
    pub fn new(count: usize) -> Self {
        ScreeningRecords {
            state: vec![ScreeningState::Routine; count],
            last_screen_age: vec![None; count],
            compliant_routine: vec![true; count],
            compliant_surveillance: vec![true; count],
        }
    }

    /// Draw compliance flags: one pass over the cohort for routine visits,
    /// then one for surveillance. An agent attends when her draw is at or
    /// above the never-attend fraction.
    pub fn with_compliance(
        count: usize,
        compliance: &ComplianceParameters,
        draws: &mut impl UniformDraw,
    ) -> Self {
        let mut records = ScreeningRecords::new(count);
        for flag in records.compliant_routine.iter_mut() {
            *flag = draws.uniform() >= compliance.never;
        }
        for flag in records.compliant_surveillance.iter_mut() {
            *flag = draws.uniform() >= compliance.never_surveillance;
        }
        records
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Append bookkeeping for one newly created agent.
    pub fn push(&mut self, compliant_routine: bool, compliant_surveillance: bool) -> AgentId {
        let id = AgentId(self.state.len());
        self.state.push(ScreeningState::Routine);
        self.last_screen_age.push(None);
        self.compliant_routine.push(compliant_routine);
        self.compliant_surveillance.push(compliant_surveillance);
        id
    }

    pub fn state(&self, agent: AgentId) -> ScreeningState {
        self.state[agent.0]
    }

    pub fn set_state(&mut self, agent: AgentId, state: ScreeningState) {
        self.state[agent.0] = state;
    }

    pub fn last_screen_age(&self, agent: AgentId) -> Option<f64> {
        self.last_screen_age[agent.0]
    }

    pub fn mark_screened(&mut self, agent: AgentId, age: f64) {
        self.last_screen_age[agent.0] = Some(age);
    }
}

/// The disease-progression engine as seen from the screening core.
///
/// Implementors own the clock, the hidden disease state, the living-agent
/// set, the event log and the clinical actions. The screening core reads
/// through this trait and writes only the [`ScreeningRecords`].
pub trait Cohort {
    fn time(&self) -> Step;

    fn age(&self, agent: AgentId) -> f64;

    fn snapshot(&self, agent: AgentId) -> DiseaseSnapshot;

    /// Living agents in the engine's iteration order.
    fn living_agents(&self) -> Vec<AgentId>;

    fn screening(&self) -> &ScreeningRecords;

    fn screening_mut(&mut self) -> &mut ScreeningRecords;

    fn record_event(&mut self, record: EventRecord);

    /// Treat a cervical intraepithelial lesion found on screening.
    fn treat_cin(&mut self, agent: AgentId);

    /// Mark the agent's cancer as detected.
    fn detect_cancer(&mut self, agent: AgentId);
}
