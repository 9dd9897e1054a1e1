use crate::cohort::Cohort;
use crate::config::ScreeningParameters;
use crate::error::ScreeningError;
use crate::state::ScreeningState;
use crate::types::AgentId;

/// Whether a screening visit is due for `agent` now.
///
/// - An agent whose cancer has been detected is never screened again.
/// - ROUTINE agents are only screened inside the routine age window.
/// - The re-screen interval depends on the screening state; a detected HIV
///   infection tightens it to the HIV interval when that is shorter.
/// - An agent never screened before is due immediately.
///
/// Pure query: calling it never changes the cohort.
pub fn is_due<C: Cohort + ?Sized>(
    cohort: &C,
    params: &ScreeningParameters,
    agent: AgentId,
) -> Result<bool, ScreeningError> {
    let snapshot = cohort.snapshot(agent);
    if snapshot.cancer_detected() {
        return Ok(false);
    }

    let age = cohort.age(agent);
    let state = cohort.screening().state(agent);
    let interval = match state {
        ScreeningState::Routine => {
            if age < params.age_routine_start || age > params.age_routine_end {
                return Ok(false);
            }
            params.interval_routine
        }
        ScreeningState::ReTest => params.interval_re_test,
        ScreeningState::Surveillance => params.interval_surveillance,
        ScreeningState::Colposcopy => {
            return Err(ScreeningError::UnexpectedScreeningState { agent, state });
        }
    };
    let interval = if snapshot.hiv_detected { interval.min(params.interval_hiv) } else { interval };

    Ok(match cohort.screening().last_screen_age(agent) {
        None => true,
        Some(last) => age - last >= interval,
    })
}

/// Whether the agent attends a visit in her current screening state.
/// Only ROUTINE and SURVEILLANCE visits can be skipped.
pub fn is_compliant<C: Cohort + ?Sized>(cohort: &C, agent: AgentId) -> bool {
    let records = cohort.screening();
    match records.state(agent) {
        ScreeningState::Routine => records.compliant_routine[agent.0],
        ScreeningState::Surveillance => records.compliant_surveillance[agent.0],
        _ => true,
    }
}
