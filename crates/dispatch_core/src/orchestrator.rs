//! Batch orchestrator (§4.7): the top-level per-tick loop binding
//! admission, insertion evaluation, LAP, commit, retry, rebalance, and
//! vehicle advancement, plus the tail-flush phase.

use crate::commit::{self, Reroute};
use crate::config::ServiceParams;
use crate::events::{AttemptRecord, Event, Move, TrackPoint, VehicleTrack};
use crate::insertion::best_insertion_for_vehicle;
use crate::lap::solve_lap;
use crate::model::{PendingState, ReqId, Request, VehId, VehicleState};
use crate::rebalance;
use crate::retry::{self, RetryOutcome};
use crate::routing::RouteOracleHandle;
use rand::Rng;
use std::collections::HashMap;

/// Everything produced by one run, ready for the output writers (§6).
pub struct RunOutput {
    pub served: Vec<ReqId>,
    pub rejected: Vec<ReqId>,
    pub events: Vec<Event>,
    pub moves: Vec<Move>,
    pub tracks: Vec<VehicleTrack>,
    pub reroutes: Vec<Reroute>,
    pub attempts: HashMap<ReqId, AttemptRecord>,
}

fn reject(
    req_id: &ReqId,
    t: f64,
    reason: &str,
    pending: &mut HashMap<ReqId, PendingState>,
    rejected: &mut Vec<ReqId>,
    events: &mut Vec<Event>,
    attempts: &mut HashMap<ReqId, AttemptRecord>,
) {
    let attempt = pending.get(req_id).map_or(1, |st| st.retry_idx + 1);
    pending.remove(req_id);
    rejected.push(req_id.clone());
    events.push(Event::reject(t, None, req_id.clone(), reason));
    attempts.insert(
        req_id.clone(),
        AttemptRecord {
            attempt,
            final_status: "rejected".to_string(),
        },
    );
}

/// Candidate vehicles for this tick: idle vehicles listed first, busy
/// next (§4.7 step 3). No sub-sampling is applied.
fn candidate_order(vehicles: &HashMap<VehId, VehicleState>) -> Vec<VehId> {
    let mut idle: Vec<VehId> = Vec::new();
    let mut busy: Vec<VehId> = Vec::new();
    let mut ids: Vec<&VehId> = vehicles.keys().collect();
    ids.sort();
    for id in ids {
        if vehicles[id].is_idle() {
            idle.push(id.clone());
        } else {
            busy.push(id.clone());
        }
    }
    idle.extend(busy);
    idle
}

/// Runs the full batch-tick loop over `requests` (assumed pre-sorted
/// ascending by `t_request`, per the ingestion contract) against the
/// given initial `vehicles`, returning the complete run output.
pub fn run(
    requests: Vec<Request>,
    mut vehicles: HashMap<VehId, VehicleState>,
    params: &ServiceParams,
    oracle: &RouteOracleHandle,
    rng: &mut impl Rng,
) -> RunOutput {
    let request_table: HashMap<ReqId, Request> =
        requests.iter().map(|r| (r.req_id.clone(), r.clone())).collect();
    let t_end = requests
        .iter()
        .map(|r| r.t_request)
        .filter(|t| t.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let t_end = if t_end.is_finite() { t_end } else { 0.0 };
    let drop_deadline_abs = t_end + params.tail_flush_max_sec;

    let mut pending: HashMap<ReqId, PendingState> = HashMap::new();
    let mut allowed_late: HashMap<ReqId, f64> = HashMap::new();
    let mut served = Vec::new();
    let mut rejected = Vec::new();
    let mut events = Vec::new();
    let mut moves = Vec::new();
    let mut reroutes = Vec::new();
    let mut attempts: HashMap<ReqId, AttemptRecord> = HashMap::new();
    let mut track_points: HashMap<VehId, Vec<TrackPoint>> = vehicles
        .keys()
        .map(|id| (id.clone(), Vec::new()))
        .collect();

    let mut next_req_idx = 0usize;
    let mut current = requests
        .first()
        .map(|r| r.t_request)
        .filter(|t| t.is_finite())
        .unwrap_or(0.0);

    loop {
        let more_unread = next_req_idx < requests.len();
        if current > t_end && pending.is_empty() && !more_unread {
            break;
        }

        // 1. Admission.
        while next_req_idx < requests.len()
            && (!requests[next_req_idx].t_request.is_finite()
                || requests[next_req_idx].t_request < current + params.batch_seconds)
        {
            let req = &requests[next_req_idx];
            if !req.t_request.is_finite() {
                reject(
                    &req.req_id,
                    current,
                    "bad_t_request",
                    &mut pending,
                    &mut rejected,
                    &mut events,
                    &mut attempts,
                );
            } else {
                pending.insert(req.req_id.clone(), retry::admit(req.t_request, params));
            }
            next_req_idx += 1;
        }

        // 2. Candidate selection, 3. insertion evaluation + cost matrix.
        let candidates = candidate_order(&vehicles);
        let mut pending_ids: Vec<ReqId> = pending.keys().cloned().collect();
        pending_ids.sort();

        if !candidates.is_empty() && !pending_ids.is_empty() {
            let mut cost = vec![vec![params.big_m; pending_ids.len()]; candidates.len()];
            let mut decisions: HashMap<(usize, usize), crate::model::InsertionDecision> =
                HashMap::new();

            for (vi, vid) in candidates.iter().enumerate() {
                let vehicle = &vehicles[vid];
                for (ri, rid) in pending_ids.iter().enumerate() {
                    let Some(pending_state) = pending.get(rid) else {
                        continue;
                    };
                    let request = &request_table[rid];
                    let p_eff = params.relax(pending_state.retry_idx);
                    if let Some(decision) = best_insertion_for_vehicle(
                        vehicle,
                        request,
                        current,
                        params.vehicle_capacity,
                        params.service_time_sec,
                        drop_deadline_abs,
                        p_eff,
                        params.max_ride_time_sec,
                        params.insert_pick_window,
                        params.insert_drop_window,
                        oracle,
                    ) {
                        cost[vi][ri] = decision.cost_sec;
                        decisions.insert((vi, ri), decision);
                    }
                }
            }

            // 4. LAP, 5. commit-guarded apply in row-major order.
            let mut pairs = solve_lap(&cost, params.big_m);
            pairs.sort();
            for (vi, ri) in pairs {
                let Some(decision) = decisions.get(&(vi, ri)) else {
                    continue;
                };
                let vid = &candidates[vi];
                let rid = &pending_ids[ri];
                let Some(pending_state) = pending.get(rid).copied() else {
                    continue;
                };
                let request = &request_table[rid];
                let p_eff = params.relax(pending_state.retry_idx);
                let vehicle = vehicles.get_mut(vid).unwrap();
                if let Some(reroute) = commit::try_commit(
                    vehicle,
                    decision,
                    request,
                    &mut allowed_late,
                    p_eff.pickup_late_sec,
                    oracle,
                    params.service_time_sec,
                    current,
                ) {
                    reroutes.push(reroute);
                    events.push(Event::assign(
                        current,
                        vid.clone(),
                        rid.clone(),
                        pending_state.retry_idx + 1,
                    ));
                    served.push(rid.clone());
                    attempts.insert(
                        rid.clone(),
                        AttemptRecord {
                            attempt: pending_state.retry_idx + 1,
                            final_status: "served".to_string(),
                        },
                    );
                    pending.remove(rid);
                }
            }
        }

        // 6. Retry / timeout pass for everything still pending.
        let still_pending: Vec<ReqId> = pending.keys().cloned().collect();
        for rid in still_pending {
            let t_request = request_table[&rid].t_request;
            let mut state = pending[&rid];
            let outcome = retry::advance_tick(&mut state, current, t_request, params);
            match outcome {
                RetryOutcome::StillPending => {}
                RetryOutcome::Retried => {
                    pending.insert(rid, state);
                }
                RetryOutcome::Exhausted => {
                    reject(
                        &rid,
                        current,
                        "pickup_window_timeout",
                        &mut pending,
                        &mut rejected,
                        &mut events,
                        &mut attempts,
                    );
                }
            }
        }

        // 7. Reactive rebalance.
        if params.enable_rebalance {
            let (rb_events, rb_reroutes) = rebalance::run_rebalance(
                &mut vehicles,
                &mut pending,
                &request_table,
                &mut allowed_late,
                oracle,
                params,
                current,
                drop_deadline_abs,
                rng,
            );
            for ev in &rb_events {
                if let Event::RebalanceAssign { req_id, .. } = ev {
                    served.push(req_id.clone());
                    attempts.insert(
                        req_id.clone(),
                        AttemptRecord {
                            attempt: 1,
                            final_status: "served".to_string(),
                        },
                    );
                }
            }
            events.extend(rb_events);
            reroutes.extend(rb_reroutes);
        }

        // 8. Vehicle advance.
        let mut ids: Vec<VehId> = vehicles.keys().cloned().collect();
        ids.sort();
        for vid in &ids {
            let vehicle = vehicles.get_mut(vid).unwrap();
            let (veh_events, veh_moves) =
                crate::advance::advance_vehicle(vehicle, params.batch_seconds, current, oracle, params.service_time_sec);
            events.extend(veh_events);
            moves.extend(veh_moves);
        }

        // 9. Tick-final tracks.
        for vid in &ids {
            let vehicle = &vehicles[vid];
            track_points.entry(vid.clone()).or_default().push(TrackPoint {
                t: current + params.batch_seconds,
                lon: vehicle.position.lon,
                lat: vehicle.position.lat,
                load: vehicle.onboard_count(),
            });
        }

        current += params.batch_seconds;
    }

    // Tail flush (§4.7 step 5).
    while vehicles.values().any(|v| !v.is_idle()) && current < drop_deadline_abs {
        let mut ids: Vec<VehId> = vehicles.keys().cloned().collect();
        ids.sort();
        for vid in &ids {
            let vehicle = vehicles.get_mut(vid).unwrap();
            let (veh_events, veh_moves) =
                crate::advance::advance_vehicle(vehicle, params.batch_seconds, current, oracle, params.service_time_sec);
            events.extend(veh_events);
            moves.extend(veh_moves);
        }
        for vid in &ids {
            let vehicle = &vehicles[vid];
            track_points.entry(vid.clone()).or_default().push(TrackPoint {
                t: current + params.batch_seconds,
                lon: vehicle.position.lon,
                lat: vehicle.position.lat,
                load: vehicle.onboard_count(),
            });
        }
        current += params.batch_seconds;
    }

    let remaining: Vec<ReqId> = pending.keys().cloned().collect();
    for rid in remaining {
        reject(
            &rid,
            current,
            "end_flush",
            &mut pending,
            &mut rejected,
            &mut events,
            &mut attempts,
        );
    }

    let tracks = track_points
        .into_iter()
        .map(|(veh_id, points)| VehicleTrack { veh_id, points })
        .collect();

    RunOutput {
        served,
        rejected,
        events,
        moves,
        tracks,
        reroutes,
        attempts,
    }
}
