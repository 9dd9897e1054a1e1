use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::trace;

use crate::cohort::{Cohort, ScreeningRecords};
use crate::config::{CinTreatmentParameters, SimulationConfig, TreatmentParameters};
use crate::events::{Event, EventLog, EventRecord};
use crate::snapshot::DiseaseSnapshot;
use crate::state::{
    CancerDetectionState, CancerState, CervicalLesionState, HpvState, HpvStrain, StrainMap,
};
use crate::types::{AgentId, Step};

/// ChaCha stream ids under one seed. Stream 0 is left to the screening draws.
const COHORT_STREAM: u64 = 1;
const CLINICAL_STREAM: u64 = 2;

/// Hidden disease state of one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentProfile {
    pub age: f64,
    pub hpv_strains: StrainMap<HpvState>,
    pub cervical_lesion: CervicalLesionState,
    pub cancer: CancerState,
    pub cancer_detection: CancerDetectionState,
    pub hiv_detected: bool,
}

impl Default for AgentProfile {
    fn default() -> Self {
        AgentProfile {
            age: 30.0,
            hpv_strains: StrainMap::filled(HpvState::Normal),
            cervical_lesion: CervicalLesionState::Normal,
            cancer: CancerState::Normal,
            cancer_detection: CancerDetectionState::Undetected,
            hiv_detected: false,
        }
    }
}

/// CIN treatment method; assigned once per agent and reused on every treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CinTreatment {
    Leep,
    Cryo,
}

impl CinTreatment {
    fn event(self) -> Event {
        match self {
            CinTreatment::Leep => Event::TreatmentLeep,
            CinTreatment::Cryo => Event::TreatmentCryo,
        }
    }
}

/// In-memory reference cohort: owns the clock, the hidden disease state,
/// the event log and the clinical actions. It does not progress disease;
/// callers mutate profiles between steps.
pub struct InMemoryCohort {
    time: Step,
    profiles: Vec<AgentProfile>,
    alive: Vec<bool>,
    screening: ScreeningRecords,
    /// Completed events in recording order.
    pub log: EventLog,
    treatment: TreatmentParameters,
    treatment_methods: Vec<Option<CinTreatment>>,
    /// Drives treatment method assignment and effectiveness only.
    rng: ChaCha20Rng,
}

impl InMemoryCohort {
    /// An empty cohort whose clinical actions draw from a stream seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        InMemoryCohort {
            time: Step(0),
            profiles: Vec::new(),
            alive: Vec::new(),
            screening: ScreeningRecords::new(0),
            log: EventLog::new(),
            treatment: TreatmentParameters::default(),
            treatment_methods: Vec::new(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn with_treatment(mut self, treatment: TreatmentParameters) -> Self {
        self.treatment = treatment;
        self
    }

    /// Build a synthetic cohort from `config.cohort`.
    ///
    /// Compliance flags are drawn first (routine pass, then surveillance
    /// pass), then each agent's age and starting infections in id order.
    pub fn synthetic(config: &SimulationConfig) -> Self {
        let shape = &config.cohort;
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        rng.set_stream(COHORT_STREAM);
        let screening =
            ScreeningRecords::with_compliance(shape.agents, &config.screening.compliance, &mut rng);

        let profiles: Vec<AgentProfile> =
            (0..shape.agents).map(|_| synthetic_profile(config, &mut rng)).collect();

        let mut clinical = ChaCha20Rng::seed_from_u64(config.seed);
        clinical.set_stream(CLINICAL_STREAM);

        InMemoryCohort {
            time: Step(0),
            alive: vec![true; profiles.len()],
            treatment_methods: vec![None; profiles.len()],
            profiles,
            screening,
            log: EventLog::new(),
            treatment: config.treatment,
            rng: clinical,
        }
    }

    pub fn push(
        &mut self,
        profile: AgentProfile,
        compliant_routine: bool,
        compliant_surveillance: bool,
    ) -> AgentId {
        let id = self.screening.push(compliant_routine, compliant_surveillance);
        self.profiles.push(profile);
        self.alive.push(true);
        self.treatment_methods.push(None);
        id
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profile(&self, agent: AgentId) -> &AgentProfile {
        &self.profiles[agent.0]
    }

    pub fn profile_mut(&mut self, agent: AgentId) -> &mut AgentProfile {
        &mut self.profiles[agent.0]
    }

    pub fn treatment_method(&self, agent: AgentId) -> Option<CinTreatment> {
        self.treatment_methods[agent.0]
    }

    pub fn kill(&mut self, agent: AgentId) {
        self.alive[agent.0] = false;
    }

    pub fn is_alive(&self, agent: AgentId) -> bool {
        self.alive[agent.0]
    }

    /// Advance the clock one year; every living agent ages by one year.
    pub fn advance_year(&mut self) {
        self.time = self.time.next();
        for (profile, alive) in self.profiles.iter_mut().zip(&self.alive) {
            if *alive {
                profile.age += 1.0;
            }
        }
    }

    fn method_params(&self, method: CinTreatment) -> &CinTreatmentParameters {
        match method {
            CinTreatment::Leep => &self.treatment.leep,
            CinTreatment::Cryo => &self.treatment.cryo,
        }
    }
}

impl Cohort for InMemoryCohort {
    fn time(&self) -> Step {
        self.time
    }

    fn age(&self, agent: AgentId) -> f64 {
        self.profiles[agent.0].age
    }

    fn snapshot(&self, agent: AgentId) -> DiseaseSnapshot {
        let p = &self.profiles[agent.0];
        DiseaseSnapshot::new(p.hpv_strains, p.cervical_lesion, p.cancer, p.cancer_detection, p.hiv_detected)
    }

    fn living_agents(&self) -> Vec<AgentId> {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| AgentId(i))
            .collect()
    }

    fn screening(&self) -> &ScreeningRecords {
        &self.screening
    }

    fn screening_mut(&mut self) -> &mut ScreeningRecords {
        &mut self.screening
    }

    fn record_event(&mut self, record: EventRecord) {
        self.log.record(record);
    }

    fn treat_cin(&mut self, agent: AgentId) {
        let method = match self.treatment_methods[agent.0] {
            Some(m) => m,
            None => {
                let m = if self.rng.random::<f64>() < self.treatment.leep.proportion {
                    CinTreatment::Leep
                } else {
                    CinTreatment::Cryo
                };
                self.treatment_methods[agent.0] = Some(m);
                m
            }
        };
        let params = *self.method_params(method);
        self.log.record(EventRecord {
            time: self.time,
            agent,
            event: method.event(),
            cost: params.cost,
        });

        let effective = self.rng.random::<f64>() < params.effectiveness;
        if effective {
            let strains = &mut self.profiles[agent.0].hpv_strains;
            for strain in HpvStrain::ALL {
                strains[strain] = HpvState::Normal;
            }
        }
        trace!(agent = agent.0, ?method, effective, "cin treated");
    }

    fn detect_cancer(&mut self, agent: AgentId) {
        self.profiles[agent.0].cancer_detection = CancerDetectionState::Detected;
        trace!(agent = agent.0, "cancer detected");
    }
}

fn synthetic_profile(config: &SimulationConfig, rng: &mut ChaCha20Rng) -> AgentProfile {
    let shape = &config.cohort;
    let age = rng.random_range(shape.age_min..=shape.age_max).floor();

    let mut hpv_strains = StrainMap::filled(HpvState::Normal);
    for strain in HpvStrain::ALL {
        if rng.random::<f64>() < shape.strain_prevalence {
            hpv_strains[strain] = match rng.random::<f64>() {
                x if x < 0.6 => HpvState::Hpv,
                x if x < 0.85 => HpvState::Cin1,
                _ => HpvState::Cin23,
            };
        }
    }

    let mut cancer = CancerState::Normal;
    if rng.random::<f64>() < shape.cancer_prevalence {
        hpv_strains[HpvStrain::Sixteen] = HpvState::Cancer;
        cancer = CancerState::Local;
    }

    let cervical_lesion = match hpv_strains.worst() {
        HpvState::Normal => CervicalLesionState::Normal,
        HpvState::Hpv => CervicalLesionState::Ascus,
        HpvState::Cin1 => CervicalLesionState::Lsil,
        HpvState::Cin23 | HpvState::Cancer => CervicalLesionState::Hsil,
    };

    AgentProfile {
        age,
        hpv_strains,
        cervical_lesion,
        cancer,
        cancer_detection: CancerDetectionState::Undetected,
        hiv_detected: rng.random::<f64>() < shape.hiv_prevalence,
    }
}
