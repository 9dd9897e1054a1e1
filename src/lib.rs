pub mod cohort;
pub mod config;
pub mod diagnostics;
pub mod draws;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod population;
pub mod protocol;
pub mod simulation;
pub mod snapshot;
pub mod state;
pub mod triage;
pub mod types;
