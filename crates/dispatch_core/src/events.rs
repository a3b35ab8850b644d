//! Event log entries (§6 `events.json`).

use crate::model::{ReqId, VehId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "ASSIGN")]
    Assign {
        t: f64,
        veh_id: VehId,
        req_id: ReqId,
        attempt: u32,
    },
    #[serde(rename = "PICKUP")]
    Pickup { t: f64, veh_id: VehId, req_id: ReqId },
    #[serde(rename = "DROPOFF")]
    Dropoff { t: f64, veh_id: VehId, req_id: ReqId },
    #[serde(rename = "REJECT")]
    Reject {
        t: f64,
        veh_id: Option<VehId>,
        req_id: ReqId,
        reason: String,
    },
    #[serde(rename = "REBALANCE_ASSIGN")]
    RebalanceAssign { t: f64, veh_id: VehId, req_id: ReqId },
}

impl Event {
    pub fn assign(t: f64, veh_id: VehId, req_id: ReqId, attempt: u32) -> Self {
        Event::Assign {
            t,
            veh_id,
            req_id,
            attempt,
        }
    }

    pub fn pickup(t: f64, veh_id: VehId, req_id: ReqId) -> Self {
        Event::Pickup { t, veh_id, req_id }
    }

    pub fn dropoff(t: f64, veh_id: VehId, req_id: ReqId) -> Self {
        Event::Dropoff { t, veh_id, req_id }
    }

    pub fn reject(t: f64, veh_id: Option<VehId>, req_id: ReqId, reason: &str) -> Self {
        Event::Reject {
            t,
            veh_id,
            req_id,
            reason: reason.to_string(),
        }
    }

    pub fn rebalance_assign(t: f64, veh_id: VehId, req_id: ReqId) -> Self {
        Event::RebalanceAssign { t, veh_id, req_id }
    }
}

/// One vehicle's displacement within a tick (§6 `moves.json`).
#[derive(Debug, Clone, Serialize)]
pub struct Move {
    pub veh_id: VehId,
    pub t_start: f64,
    pub t_end: f64,
    pub lon1: f64,
    pub lat1: f64,
    pub lon2: f64,
    pub lat2: f64,
    pub partial: bool,
    pub load: usize,
}

/// A single tick-sampled vehicle position (§6 `tracks.json`).
#[derive(Debug, Clone, Serialize)]
pub struct TrackPoint {
    pub t: f64,
    pub lon: f64,
    pub lat: f64,
    pub load: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleTrack {
    pub veh_id: VehId,
    pub points: Vec<TrackPoint>,
}

/// Final per-request outcome for `attempts.json`.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub final_status: String,
}
