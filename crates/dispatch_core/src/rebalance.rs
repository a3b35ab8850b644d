//! Reactive rebalance pass (§4.5): pairs "hot" pending requests with
//! nearby idle vehicles and attempts immediate insertion through the same
//! evaluator+commit-guard pipeline used by the main assignment loop.

use crate::commit::{self, Reroute};
use crate::config::ServiceParams;
use crate::events::Event;
use crate::insertion::best_insertion_for_vehicle;
use crate::model::{PendingState, ReqId, Request, VehId, VehicleState};
use crate::routing::RouteOracleHandle;
use rand::Rng;
use std::collections::HashMap;

const TOP_K: usize = 3;
const FALLBACK_HOT_COUNT: usize = 20;

/// Selects hot requests per §4.5 step 2.
fn select_hot(
    pending: &HashMap<ReqId, PendingState>,
    requests: &HashMap<ReqId, Request>,
    params: &ServiceParams,
) -> Vec<ReqId> {
    let mut hot: Vec<ReqId> = if params.max_retries >= 1 {
        let threshold = params.max_retries - 1;
        pending
            .iter()
            .filter(|(_, st)| st.retry_idx >= threshold)
            .map(|(id, _)| id.clone())
            .collect()
    } else {
        Vec::new()
    };

    if hot.is_empty() {
        let mut sorted: Vec<(ReqId, u32, f64)> = pending
            .iter()
            .map(|(id, st)| (id.clone(), st.retry_idx, requests[id].t_request))
            .collect();
        sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.partial_cmp(&b.2).unwrap()));
        let n = sorted.len();
        let take = n.min(FALLBACK_HOT_COUNT);
        hot = sorted[n - take..].iter().map(|x| x.0.clone()).collect();
    }

    hot.sort_by(|a, b| {
        requests[a]
            .t_request
            .partial_cmp(&requests[b].t_request)
            .unwrap()
    });
    hot
}

/// Runs one rebalance pass, mutating `vehicles`, `pending`, and
/// `allowed_late` in place, and returning the `REBALANCE_ASSIGN` events
/// plus any reroute records produced.
#[allow(clippy::too_many_arguments)]
pub fn run_rebalance(
    vehicles: &mut HashMap<VehId, VehicleState>,
    pending: &mut HashMap<ReqId, PendingState>,
    requests: &HashMap<ReqId, Request>,
    allowed_late: &mut HashMap<ReqId, f64>,
    oracle: &RouteOracleHandle,
    params: &ServiceParams,
    now: f64,
    drop_deadline_abs: f64,
    rng: &mut impl Rng,
) -> (Vec<Event>, Vec<Reroute>) {
    let hot = select_hot(pending, requests, params);
    let mut idle: Vec<VehId> = vehicles
        .values()
        .filter(|v| v.is_idle())
        .map(|v| v.veh_id.clone())
        .collect();

    let mut events = Vec::new();
    let mut reroutes = Vec::new();

    for req_id in hot {
        if idle.is_empty() {
            break;
        }
        let request = &requests[&req_id];

        let mut scored: Vec<(f64, VehId)> = idle
            .iter()
            .map(|vid| {
                let vpos = vehicles[vid].position;
                let dur = oracle.oneway_duration_or_fallback(vpos, request.origin);
                (dur, vid.clone())
            })
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let take = scored.len().min(TOP_K);
        let choice = rng.gen_range(0..take);
        let chosen_veh = scored[choice].1.clone();
        idle.retain(|v| v != &chosen_veh);

        let pending_state = match pending.get(&req_id) {
            Some(&st) => st,
            None => continue,
        };
        let p_eff = params.relax(pending_state.retry_idx);
        let vehicle = &vehicles[&chosen_veh];

        let decision = best_insertion_for_vehicle(
            vehicle,
            request,
            now,
            params.vehicle_capacity,
            params.service_time_sec,
            drop_deadline_abs,
            p_eff,
            params.max_ride_time_sec,
            params.insert_pick_window,
            params.insert_drop_window,
            oracle,
        );
        let Some(decision) = decision else { continue };

        let vehicle_mut = vehicles.get_mut(&chosen_veh).unwrap();
        if let Some(reroute) = commit::try_commit(
            vehicle_mut,
            &decision,
            request,
            allowed_late,
            pending_state.late_eff,
            oracle,
            params.service_time_sec,
            now,
        ) {
            events.push(Event::rebalance_assign(now, chosen_veh.clone(), req_id.clone()));
            reroutes.push(reroute);
            pending.remove(&req_id);
        }
    }

    (events, reroutes)
}
