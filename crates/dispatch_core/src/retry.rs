//! Retry / pending state machine (§4.4): tracks per-request retry index,
//! effective late bound, and absolute deadline across ticks.

use crate::config::ServiceParams;
use crate::model::PendingState;

/// Initializes `PendingState` for a freshly-admitted request.
pub fn admit(t_request: f64, params: &ServiceParams) -> PendingState {
    let late_eff = params.pickup_late_sec;
    PendingState {
        retry_idx: 0,
        late_eff,
        deadline: t_request + late_eff,
    }
}

/// What happened to a pending request at the end of a tick (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    StillPending,
    Retried,
    Exhausted,
}

/// Advances `state` in place at tick boundary for a request that was not
/// assigned this tick. `now` is the current absolute tick time and
/// `t_request` the request's original arrival time.
pub fn advance_tick(
    state: &mut PendingState,
    now: f64,
    t_request: f64,
    params: &ServiceParams,
) -> RetryOutcome {
    if now < state.deadline {
        return RetryOutcome::StillPending;
    }
    if state.retry_idx < params.max_retries {
        state.retry_idx += 1;
        let k = state.retry_idx as f64;
        state.late_eff = params.pickup_late_sec
            + (params.wait_bonus_per_retry_sec * k).min(params.wait_bonus_cap_sec);
        state.deadline = t_request + state.late_eff;
        RetryOutcome::Retried
    } else {
        RetryOutcome::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_sets_deadline_from_base_late() {
        let params = ServiceParams::default().with_pickup_late_sec(600.0);
        let state = admit(100.0, &params);
        assert_eq!(state.retry_idx, 0);
        assert_eq!(state.deadline, 700.0);
    }

    #[test]
    fn advance_tick_retries_when_deadline_passed_and_budget_remains() {
        let params = ServiceParams::default()
            .with_pickup_late_sec(600.0)
            .with_max_retries(3);
        let mut state = admit(0.0, &params);
        let outcome = advance_tick(&mut state, 601.0, 0.0, &params);
        assert_eq!(outcome, RetryOutcome::Retried);
        assert_eq!(state.retry_idx, 1);
        assert_eq!(state.late_eff, 600.0 + 180.0);
        assert_eq!(state.deadline, 780.0);
    }

    #[test]
    fn advance_tick_exhausts_after_max_retries() {
        let params = ServiceParams::default()
            .with_pickup_late_sec(600.0)
            .with_max_retries(0);
        let mut state = admit(0.0, &params);
        let outcome = advance_tick(&mut state, 601.0, 0.0, &params);
        assert_eq!(outcome, RetryOutcome::Exhausted);
    }

    #[test]
    fn still_pending_before_deadline() {
        let params = ServiceParams::default().with_pickup_late_sec(600.0);
        let mut state = admit(0.0, &params);
        let outcome = advance_tick(&mut state, 100.0, 0.0, &params);
        assert_eq!(outcome, RetryOutcome::StillPending);
        assert_eq!(state.retry_idx, 0);
    }
}
