use cervsim::config::{CohortConfig, SimulationConfig};
use cervsim::population::{AgentProfile, InMemoryCohort};
use cervsim::protocol::ProtocolKind;
use cervsim::simulation::Simulation;
use cervsim::state::{HpvState, HpvStrain};

pub struct Scenario {
    pub agents: usize,
    pub strain_prevalence: f64,
}

pub const SMALL: Scenario = Scenario { agents: 1_000, strain_prevalence: 0.08 };

pub const MEDIUM: Scenario = Scenario { agents: 10_000, strain_prevalence: 0.08 };

pub const LARGE: Scenario = Scenario { agents: 100_000, strain_prevalence: 0.08 };

/// Every agent due on the first step: ages inside the routine window and
/// never screened. Every fifth agent carries a high-risk CIN_1.
pub fn due_cohort(agents: usize) -> InMemoryCohort {
    let mut cohort = InMemoryCohort::new(7);
    for i in 0..agents {
        let mut profile = AgentProfile { age: 25.0 + (i % 25) as f64, ..AgentProfile::default() };
        if i % 5 == 0 {
            profile.hpv_strains[HpvStrain::HighRisk] = HpvState::Cin1;
        }
        cohort.push(profile, true, true);
    }
    cohort
}

pub fn build_simulation(scenario: &Scenario, kind: ProtocolKind, seed: u64, years: u32) -> Simulation {
    let mut config = SimulationConfig::canonical();
    config.seed = seed;
    config.years = years;
    config.cohort = CohortConfig {
        agents: scenario.agents,
        strain_prevalence: scenario.strain_prevalence,
        ..CohortConfig::default()
    };
    Simulation::from_config(config)
        .expect("canonical config is valid")
        .with_protocol(kind)
}
