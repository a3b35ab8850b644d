//! Shared schedule simulation: walks an ordered list of stops from a
//! starting position, accumulating travel and service time. Used
//! identically by the insertion evaluator (`crate::insertion`) and the
//! commit guard (`crate::commit`) so that "arrivals as evaluated" and
//! "arrivals as re-validated at commit time" can never silently diverge.

use crate::model::Stop;
use crate::routing::RouteOracleHandle;

/// Result of walking a schedule: `arrivals[i]` is the local time (seconds
/// since the walk started) at which `schedule[i]` is reached, *before* its
/// service time is applied. `total_td` is the cumulative time after the
/// last stop's service time, i.e. when the vehicle becomes free again.
pub struct ScheduleSimulation {
    pub arrivals: Vec<f64>,
    pub total_td: f64,
}

pub fn simulate_schedule(
    start: crate::geo::LonLat,
    schedule: &[Stop],
    oracle: &RouteOracleHandle,
    service_time_sec: f64,
) -> ScheduleSimulation {
    let mut t = 0.0;
    let mut pos = start;
    let mut arrivals = Vec::with_capacity(schedule.len());
    for stop in schedule {
        t += oracle.oneway_duration_or_fallback(pos, stop.position);
        arrivals.push(t);
        t += service_time_sec;
        pos = stop.position;
    }
    ScheduleSimulation {
        arrivals,
        total_td: t,
    }
}
