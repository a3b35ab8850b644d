//! Vehicle advancer (§4.6): consumes `batch_seconds` of simulated time per
//! vehicle per tick, walking the schedule leg by leg and applying pickup/
//! dropoff effects.

use crate::events::{Event, Move};
use crate::model::{ActivePath, StopKind, VehicleState};
use crate::routing::RouteOracleHandle;

/// Advances one vehicle by `dt` seconds, mutating it in place and
/// returning the events and move records produced.
pub fn advance_vehicle(
    vehicle: &mut VehicleState,
    dt: f64,
    now: f64,
    oracle: &RouteOracleHandle,
    service_time_sec: f64,
) -> (Vec<Event>, Vec<Move>) {
    let mut remaining = dt;
    let mut t_cursor = now;
    let mut events = Vec::new();
    let mut moves = Vec::new();

    loop {
        if remaining <= 0.0 {
            break;
        }
        if vehicle.schedule.is_empty() {
            vehicle.t_avail += remaining;
            vehicle.active_path = None;
            break;
        }

        let stop = vehicle.schedule[0].clone();
        let travel = oracle.oneway_duration_or_fallback(vehicle.position, stop.position);

        if travel > remaining {
            let new_pos = oracle.progress_point_or_fallback(vehicle.position, stop.position, remaining);
            moves.push(Move {
                veh_id: vehicle.veh_id.clone(),
                t_start: t_cursor,
                t_end: t_cursor + remaining,
                lon1: vehicle.position.lon,
                lat1: vehicle.position.lat,
                lon2: new_pos.lon,
                lat2: new_pos.lat,
                partial: true,
                load: vehicle.onboard_count(),
            });
            vehicle.active_path = Some(ActivePath {
                from: vehicle.position,
                to: stop.position,
                elapsed_s: remaining,
            });
            vehicle.position = new_pos;
            remaining = 0.0;
        } else {
            let arrival_t = t_cursor + travel;
            moves.push(Move {
                veh_id: vehicle.veh_id.clone(),
                t_start: t_cursor,
                t_end: arrival_t,
                lon1: vehicle.position.lon,
                lat1: vehicle.position.lat,
                lon2: stop.position.lon,
                lat2: stop.position.lat,
                partial: false,
                load: vehicle.onboard_count(),
            });
            vehicle.position = stop.position;
            vehicle.active_path = None;
            vehicle.schedule.remove(0);

            match stop.kind {
                StopKind::Pickup => {
                    if let Some(id) = &stop.req_id {
                        if !vehicle.onboard.contains(id) {
                            vehicle.onboard.push(id.clone());
                        }
                        events.push(Event::pickup(arrival_t, vehicle.veh_id.clone(), id.clone()));
                    }
                }
                StopKind::Dropoff => {
                    if let Some(id) = &stop.req_id {
                        vehicle.onboard.retain(|x| x != id);
                        events.push(Event::dropoff(arrival_t, vehicle.veh_id.clone(), id.clone()));
                    }
                }
                StopKind::Rebalance => {}
            }

            remaining -= travel + service_time_sec;
            t_cursor = arrival_t + service_time_sec;
        }
    }

    (events, moves)
}
