use serde::Serialize;

/// Dense index of a simulated woman. The mapping from any external identifier
/// to this index belongs to the disease engine that owns the cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AgentId(pub usize);

/// Simulation time step (1 unit = 1 simulated year).
/// The clock is shared across the cohort; ages advance with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Step(pub u32);

impl Step {
    pub fn next(self) -> Self {
        Step(self.0 + 1)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}
