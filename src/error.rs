use thiserror::Error;

use crate::state::{CancerState, HpvState, ScreeningState};
use crate::types::AgentId;

/// Failures surfaced to the outer simulation loop. None of these are retried:
/// they indicate a bug in the calling engine or a misconfigured protocol.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("cancer state {0} is not screenable")]
    NotScreenable(CancerState),

    #[error("contradictory disease state: hpv {hpv} with cancer {cancer}")]
    ContradictoryState { hpv: HpvState, cancer: CancerState },

    #[error("co-test is only applicable for ages 30-65, got {0}")]
    AgeOutOfRange(f64),

    #[error("unexpected screening state {state} for {agent}")]
    UnexpectedScreeningState { agent: AgentId, state: ScreeningState },

    #[error("unexpected {test} outcome {outcome}")]
    UnexpectedOutcome { test: &'static str, outcome: &'static str },

    #[error("unknown screening protocol: {0}")]
    UnknownProtocol(String),

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("malformed parameters: {0}")]
    Parameters(#[from] serde_json::Error),
}
