//! Table-driven screening protocols.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::{debug, trace};

use crate::cohort::Cohort;
use crate::config::{ScreeningParameters, TestParameters};
use crate::diagnostics::DiagnosticSuite;
use crate::draws::UniformDraw;
use crate::eligibility;
use crate::error::ScreeningError;
use crate::events::{Event, EventRecord};
use crate::snapshot::DiseaseSnapshot;
use crate::state::{HpvStrain, ScreeningState, ScreeningTestResult, StrainMap};
use crate::types::AgentId;

/// Registered screening policies, named as they appear in parameter files.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// No-screening baseline.
    None,
    Via,
    DnaThenTreatment,
    DnaThenVia,
    DnaThenTriage,
    Cytology,
}

impl ProtocolKind {
    fn entry(self) -> Option<&'static Stage> {
        match self {
            ProtocolKind::None => None,
            ProtocolKind::Via => Some(&VIA_ONLY),
            ProtocolKind::DnaThenTreatment => Some(&DNA_THEN_TREATMENT),
            ProtocolKind::DnaThenVia => Some(&DNA_THEN_VIA),
            ProtocolKind::DnaThenTriage => Some(&DNA_THEN_TRIAGE),
            ProtocolKind::Cytology => Some(&CYTOLOGY_ONLY),
        }
    }
}

/// Test run at a protocol stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TestKind {
    Via,
    Dna,
    Cytology,
    CancerInspection,
}

impl TestKind {
    /// Event recorded for this test; agents already under surveillance get
    /// the surveillance variant.
    pub fn event(self, in_surveillance: bool) -> Event {
        match (self, in_surveillance) {
            (TestKind::Via, false) => Event::ScreeningVia,
            (TestKind::Via, true) => Event::SurveillanceVia,
            (TestKind::Dna, false) => Event::ScreeningDna,
            (TestKind::Dna, true) => Event::SurveillanceDna,
            (TestKind::Cytology, false) => Event::ScreeningCytology,
            (TestKind::Cytology, true) => Event::SurveillanceCytology,
            (TestKind::CancerInspection, false) => Event::ScreeningCancerInspection,
            (TestKind::CancerInspection, true) => Event::SurveillanceCancerInspection,
        }
    }
}

/// Routing key for a test result. DNA results collapse to which strains
/// came back positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Negative,
    Positive,
    Cancer,
    Hpv16Or18,
    OtherHighRisk,
}

impl From<ScreeningTestResult> for Outcome {
    fn from(result: ScreeningTestResult) -> Self {
        match result {
            ScreeningTestResult::Negative => Outcome::Negative,
            ScreeningTestResult::Positive => Outcome::Positive,
            ScreeningTestResult::Cancer => Outcome::Cancer,
        }
    }
}

impl Outcome {
    fn from_dna(results: &StrainMap<ScreeningTestResult>) -> Self {
        if results.all_negative() {
            Outcome::Negative
        } else if results.is_positive(HpvStrain::Sixteen) || results.is_positive(HpvStrain::Eighteen) {
            Outcome::Hpv16Or18
        } else {
            Outcome::OtherHighRisk
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Transition {
    /// Finish the visit in this screening state.
    Set(ScreeningState),
    /// Treat the lesion; the agent moves to surveillance.
    Treat,
    /// Record the cancer as detected; the agent moves to surveillance.
    Detect,
    /// Run a follow-up test within the same visit.
    Next(&'static Stage),
}

#[derive(Debug)]
pub struct Stage {
    pub test: TestKind,
    pub routes: &'static [(Outcome, Transition)],
}

impl Stage {
    fn route(&self, outcome: Outcome) -> Result<Transition, ScreeningError> {
        self.routes
            .iter()
            .find(|(o, _)| *o == outcome)
            .map(|(_, t)| *t)
            .ok_or_else(|| ScreeningError::UnexpectedOutcome {
                test: self.test.into(),
                outcome: outcome.into(),
            })
    }
}

static CANCER_INSPECTION: Stage = Stage {
    test: TestKind::CancerInspection,
    routes: &[(Outcome::Negative, Transition::Treat), (Outcome::Cancer, Transition::Detect)],
};

static VIA_ONLY: Stage = Stage {
    test: TestKind::Via,
    routes: &[
        (Outcome::Negative, Transition::Set(ScreeningState::Routine)),
        (Outcome::Positive, Transition::Treat),
        (Outcome::Cancer, Transition::Detect),
    ],
};

static VIA_TRIAGE: Stage = Stage {
    test: TestKind::Via,
    routes: &[
        (Outcome::Negative, Transition::Set(ScreeningState::ReTest)),
        (Outcome::Positive, Transition::Treat),
        (Outcome::Cancer, Transition::Detect),
    ],
};

static CYTOLOGY_ONLY: Stage = Stage {
    test: TestKind::Cytology,
    routes: &[
        (Outcome::Negative, Transition::Set(ScreeningState::Routine)),
        (Outcome::Positive, Transition::Treat),
    ],
};

static DNA_THEN_TREATMENT: Stage = Stage {
    test: TestKind::Dna,
    routes: &[
        (Outcome::Negative, Transition::Set(ScreeningState::Routine)),
        (Outcome::Hpv16Or18, Transition::Next(&CANCER_INSPECTION)),
        (Outcome::OtherHighRisk, Transition::Next(&CANCER_INSPECTION)),
    ],
};

static DNA_THEN_VIA: Stage = Stage {
    test: TestKind::Dna,
    routes: &[
        (Outcome::Negative, Transition::Set(ScreeningState::Routine)),
        (Outcome::Hpv16Or18, Transition::Next(&CANCER_INSPECTION)),
        (Outcome::OtherHighRisk, Transition::Next(&VIA_TRIAGE)),
    ],
};

static DNA_THEN_TRIAGE: Stage = Stage {
    test: TestKind::Dna,
    routes: &[
        (Outcome::Negative, Transition::Set(ScreeningState::Routine)),
        (Outcome::Hpv16Or18, Transition::Next(&CANCER_INSPECTION)),
        (Outcome::OtherHighRisk, Transition::Set(ScreeningState::ReTest)),
    ],
};

/// A configured screening policy.
#[derive(Debug, Clone)]
pub struct Protocol {
    kind: ProtocolKind,
    params: ScreeningParameters,
    suite: DiagnosticSuite,
}

impl Protocol {
    pub fn new(kind: ProtocolKind, params: ScreeningParameters) -> Self {
        let suite = DiagnosticSuite::new(&params);
        Protocol { kind, params, suite }
    }

    /// The protocol named by `params.protocol`.
    pub fn from_params(params: ScreeningParameters) -> Self {
        Protocol::new(params.protocol, params)
    }

    pub fn from_name(name: &str, params: ScreeningParameters) -> Result<Self, ScreeningError> {
        let kind = ProtocolKind::from_str(name)
            .map_err(|_| ScreeningError::UnknownProtocol(name.to_string()))?;
        Ok(Protocol::new(kind, params))
    }

    pub fn kind(&self) -> ProtocolKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.into()
    }

    pub fn params(&self) -> &ScreeningParameters {
        &self.params
    }

    /// The no-screening baseline is never due.
    pub fn is_due<C: Cohort + ?Sized>(
        &self,
        cohort: &C,
        agent: AgentId,
    ) -> Result<bool, ScreeningError> {
        if self.kind == ProtocolKind::None {
            return Ok(false);
        }
        eligibility::is_due(cohort, &self.params, agent)
    }

    pub fn is_compliant<C: Cohort + ?Sized>(&self, cohort: &C, agent: AgentId) -> bool {
        eligibility::is_compliant(cohort, agent)
    }

    /// Run one protocol step for `target`, or for every living agent in the
    /// cohort's order when `target` is `None`. Returns how many agents were
    /// screened.
    pub fn apply<C, D>(
        &self,
        cohort: &mut C,
        draws: &mut D,
        target: Option<AgentId>,
    ) -> Result<usize, ScreeningError>
    where
        C: Cohort + ?Sized,
        D: UniformDraw,
    {
        let Some(entry) = self.kind.entry() else {
            return Ok(0);
        };
        let agents = match target {
            Some(agent) => vec![agent],
            None => cohort.living_agents(),
        };

        let mut screened = 0;
        for agent in agents {
            if self.visit(entry, cohort, draws, agent)? {
                screened += 1;
            }
        }
        debug!(protocol = self.name(), time = cohort.time().0, screened, "protocol applied");
        Ok(screened)
    }

    fn visit<C: Cohort + ?Sized>(
        &self,
        entry: &'static Stage,
        cohort: &mut C,
        draws: &mut impl UniformDraw,
        agent: AgentId,
    ) -> Result<bool, ScreeningError> {
        if !self.is_due(cohort, agent)? || !self.is_compliant(cohort, agent) {
            return Ok(false);
        }

        let age = cohort.age(agent);
        let time = cohort.time();
        let in_surveillance = cohort.screening().state(agent) == ScreeningState::Surveillance;
        cohort.screening_mut().mark_screened(agent, age);
        let snapshot = cohort.snapshot(agent);

        let mut stage = entry;
        let next_state = loop {
            cohort.record_event(EventRecord {
                time,
                agent,
                event: stage.test.event(in_surveillance),
                cost: self.test_params(stage.test).cost,
            });
            let outcome = self.run(stage.test, &snapshot, draws)?;
            trace!(agent = agent.0, test = ?stage.test, ?outcome, "test result");

            match stage.route(outcome)? {
                Transition::Set(state) => break state,
                Transition::Treat => {
                    cohort.treat_cin(agent);
                    break ScreeningState::Surveillance;
                }
                Transition::Detect => {
                    cohort.detect_cancer(agent);
                    break ScreeningState::Surveillance;
                }
                Transition::Next(next) => stage = next,
            }
        };
        cohort.screening_mut().set_state(agent, next_state);
        trace!(agent = agent.0, state = %next_state, "visit complete");
        Ok(true)
    }

    fn run(
        &self,
        test: TestKind,
        snapshot: &DiseaseSnapshot,
        draws: &mut impl UniformDraw,
    ) -> Result<Outcome, ScreeningError> {
        let outcome = match test {
            TestKind::Via => self.suite.via.result(snapshot.max_hpv, snapshot.cancer, draws)?.into(),
            TestKind::Dna => Outcome::from_dna(&self.suite.dna.result(&snapshot.hpv_strains, draws)),
            TestKind::Cytology => self.suite.cytology.result(snapshot.cervical_lesion, draws).into(),
            TestKind::CancerInspection => {
                self.suite.cancer_inspection.result(snapshot.cancer, draws)?.into()
            }
        };
        Ok(outcome)
    }

    fn test_params(&self, test: TestKind) -> &TestParameters {
        match test {
            TestKind::Via => self.suite.via.params(),
            TestKind::Dna => self.suite.dna.params(),
            TestKind::Cytology => self.suite.cytology.params(),
            TestKind::CancerInspection => self.suite.cancer_inspection.params(),
        }
    }
}

/// Every registered protocol, keyed by name, sharing one parameter block.
pub fn registry(params: &ScreeningParameters) -> BTreeMap<&'static str, Protocol> {
    ProtocolKind::iter()
        .map(|kind| {
            let name: &'static str = kind.into();
            (name, Protocol::new(kind, params.clone()))
        })
        .collect()
}
