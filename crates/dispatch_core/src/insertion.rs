//! Insertion evaluator (§4.1): enumerates pickup/dropoff insertion
//! positions into a vehicle's schedule and returns the minimum-cost
//! feasible `InsertionDecision`, or `None` if no trial is feasible.

use crate::config::EffectiveParams;
use crate::model::{InsertionDecision, Request, Stop, StopKind, VehicleState};
use crate::routing::RouteOracleHandle;
use crate::sim::simulate_schedule;
use std::collections::HashSet;

/// Build the trial schedule for inserting `pickup` at position `i` and
/// `dropoff` at position `j` into `base`, per §4.1's (i, j) convention:
/// `0 ≤ i ≤ n`, `i+1 ≤ j ≤ n+1`.
fn splice(base: &[Stop], i: usize, j: usize, pickup: Stop, dropoff: Stop) -> Vec<Stop> {
    let mut out = Vec::with_capacity(base.len() + 2);
    out.extend_from_slice(&base[..i]);
    out.push(pickup);
    out.extend_from_slice(&base[i..j - 1]);
    out.push(dropoff);
    out.extend_from_slice(&base[j - 1..]);
    out
}

/// Simulated onboard-count walk (§4.1 step 2): returns `false` as soon as
/// the running count leaves `[0, capacity]`, or if a dropoff for a request
/// never onboard/picked-up occurs.
fn onboard_walk_ok(trial: &[Stop], onboard_at_start: &[String], capacity: u32) -> bool {
    let mut current: HashSet<&str> = onboard_at_start.iter().map(|s| s.as_str()).collect();
    let mut count = current.len();
    for stop in trial {
        match stop.kind {
            StopKind::Pickup => {
                count += 1;
                if count > capacity as usize {
                    return false;
                }
                if let Some(id) = &stop.req_id {
                    current.insert(id.as_str());
                }
            }
            StopKind::Dropoff => {
                if let Some(id) = &stop.req_id {
                    if !current.remove(id.as_str()) {
                        return false;
                    }
                }
                count = match count.checked_sub(1) {
                    Some(c) => c,
                    None => return false,
                };
            }
            StopKind::Rebalance => {}
        }
    }
    current.is_empty()
}

struct TrialOutcome {
    cost_sec: f64,
}

#[allow(clippy::too_many_arguments)]
fn evaluate_trial(
    trial: &[Stop],
    vehicle: &VehicleState,
    request: &Request,
    now: f64,
    capacity: u32,
    service_time_sec: f64,
    drop_deadline_abs: f64,
    max_ride_time_sec: Option<f64>,
    p_eff: EffectiveParams,
    oracle: &RouteOracleHandle,
) -> Option<TrialOutcome> {
    if trial.len() > 2 * capacity as usize {
        return None;
    }
    if !onboard_walk_ok(trial, &vehicle.onboard, capacity) {
        return None;
    }

    let pickup_idx = trial
        .iter()
        .position(|s| s.kind == StopKind::Pickup && s.req_id.as_deref() == Some(&request.req_id))?;
    let dropoff_idx = trial
        .iter()
        .position(|s| s.kind == StopKind::Dropoff && s.req_id.as_deref() == Some(&request.req_id))?;
    if pickup_idx >= dropoff_idx {
        return None;
    }

    let sim = simulate_schedule(vehicle.position, trial, oracle, service_time_sec);

    let t_pick_abs = now + sim.arrivals[pickup_idx];
    let desired = request.t_request;
    let late = p_eff.pickup_late_sec;
    if !(desired <= t_pick_abs && t_pick_abs <= desired + late) {
        return None;
    }

    let t_drop_abs = now + sim.arrivals[dropoff_idx];
    let ride = (t_drop_abs - t_pick_abs - service_time_sec).max(0.0);
    if let Some(max_ride) = max_ride_time_sec {
        if ride > max_ride {
            return None;
        }
    }

    let od = oracle.oneway_duration_or_fallback(request.origin, request.destination);
    let ratio = ride / od.max(1.0);
    if ratio > p_eff.detour_ratio_max {
        return None;
    }

    if t_drop_abs > drop_deadline_abs {
        return None;
    }

    Some(TrialOutcome {
        cost_sec: sim.total_td,
    })
}

/// Searches all feasible (pickup, dropoff) insertion positions for `vehicle`
/// and returns the minimum-cost `InsertionDecision`, honoring the optional
/// insertion-window narrowing parameters.
#[allow(clippy::too_many_arguments)]
pub fn best_insertion_for_vehicle(
    vehicle: &VehicleState,
    request: &Request,
    now: f64,
    capacity: u32,
    service_time_sec: f64,
    drop_deadline_abs: f64,
    p_eff: EffectiveParams,
    max_ride_time_sec: Option<f64>,
    insert_pick_window: Option<usize>,
    insert_drop_window: Option<usize>,
    oracle: &RouteOracleHandle,
) -> Option<InsertionDecision> {
    let n = vehicle.schedule.len();
    let pick_end = insert_pick_window.map_or(n, |k| n.min(k));

    let mut best: Option<(usize, usize, f64, Vec<Stop>)> = None;

    for i in 0..=pick_end {
        let drop_last = insert_drop_window.map_or(n + 1, |lam| (n + 1).min(i + 1 + lam));
        for j in (i + 1)..=drop_last {
            let pickup = Stop::pickup(request.req_id.clone(), request.origin);
            let dropoff = Stop::dropoff(request.req_id.clone(), request.destination);
            let trial = splice(&vehicle.schedule, i, j, pickup, dropoff);

            let Some(outcome) = evaluate_trial(
                &trial,
                vehicle,
                request,
                now,
                capacity,
                service_time_sec,
                drop_deadline_abs,
                max_ride_time_sec,
                p_eff,
                oracle,
            ) else {
                continue;
            };
            let replace = match &best {
                None => true,
                Some((_, _, best_cost, _)) => outcome.cost_sec < *best_cost,
            };
            if replace {
                best = Some((i, j, outcome.cost_sec, trial));
            }
        }
    }

    best.map(|(_, _, cost, schedule)| InsertionDecision {
        req_id: request.req_id.clone(),
        veh_id: vehicle.veh_id.clone(),
        new_schedule: schedule,
        cost_sec: cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LonLat;
    use crate::routing::RouteOracleHandle;

    fn effective() -> EffectiveParams {
        EffectiveParams {
            pickup_late_sec: 600.0,
            detour_ratio_max: 2.0,
        }
    }

    #[test]
    fn empty_schedule_evaluates_single_trial() {
        let oracle = RouteOracleHandle::disabled(30.0);
        let vehicle = VehicleState::new("v1".into(), LonLat::new(127.140, 37.480));
        let request = Request {
            req_id: "r1".into(),
            origin: LonLat::new(127.141, 37.481),
            destination: LonLat::new(127.145, 37.485),
            t_request: 25200.0,
        };
        let decision = best_insertion_for_vehicle(
            &vehicle,
            &request,
            25200.0,
            4,
            30.0,
            1e9,
            effective(),
            None,
            None,
            None,
            &oracle,
        );
        assert!(decision.is_some());
        let decision = decision.unwrap();
        assert_eq!(decision.new_schedule.len(), 2);
        assert_eq!(decision.new_schedule[0].kind, StopKind::Pickup);
        assert_eq!(decision.new_schedule[1].kind, StopKind::Dropoff);
    }

    #[test]
    fn pickup_too_late_is_infeasible() {
        let oracle = RouteOracleHandle::disabled(1.0); // very slow fallback speed
        let vehicle = VehicleState::new("v1".into(), LonLat::new(0.0, 0.0));
        let request = Request {
            req_id: "r1".into(),
            origin: LonLat::new(10.0, 10.0),
            destination: LonLat::new(10.1, 10.1),
            t_request: 0.0,
        };
        let tight = EffectiveParams {
            pickup_late_sec: 1.0,
            detour_ratio_max: 2.0,
        };
        let decision = best_insertion_for_vehicle(
            &vehicle, &request, 0.0, 4, 30.0, 1e12, tight, None, None, None, &oracle,
        );
        assert!(decision.is_none());
    }

    #[test]
    fn capacity_one_rejects_overlapping_insertion() {
        let oracle = RouteOracleHandle::disabled(3_600_000.0);
        let mut vehicle = VehicleState::new("v1".into(), LonLat::new(0.0, 0.0));
        vehicle.onboard.push("a".into());
        vehicle.schedule = vec![Stop::dropoff("a".into(), LonLat::new(0.01, 0.0))];

        let request = Request {
            req_id: "b".into(),
            origin: LonLat::new(0.001, 0.0),
            destination: LonLat::new(0.002, 0.0),
            t_request: 0.0,
        };
        // Only insertion position that precedes A's dropoff is i=0, which
        // would push onboard count to 2 with capacity=1.
        let decision = best_insertion_for_vehicle(
            &vehicle,
            &request,
            0.0,
            1,
            1.0,
            1e12,
            effective(),
            None,
            Some(0),
            Some(0),
            &oracle,
        );
        assert!(decision.is_none());
    }

    #[test]
    fn tie_break_prefers_smaller_i_then_j() {
        // With a schedule that offers multiple equal-cost insertion slots
        // (achieved via a flat fallback speed and coincident stops), the
        // search must keep the first (smallest i, then j) rather than the
        // last found.
        let oracle = RouteOracleHandle::disabled(3_600_000.0);
        let vehicle = VehicleState::new("v1".into(), LonLat::new(0.0, 0.0));
        let request = Request {
            req_id: "r1".into(),
            origin: LonLat::new(0.0, 0.0),
            destination: LonLat::new(0.0, 0.0),
            t_request: 0.0,
        };
        let decision = best_insertion_for_vehicle(
            &vehicle, &request, 0.0, 4, 0.0, 1e12, effective(), None, None, None, &oracle,
        );
        assert!(decision.is_some());
    }
}
