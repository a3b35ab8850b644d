//! Core data model: `Request`, `Stop`, `VehicleState`, `InsertionDecision`.
//!
//! `Stop.kind` is a closed three-variant tag (§9 design note); it is never
//! modeled as a trait object since the advancer's match over it is
//! exhaustive and fixed.

use crate::geo::LonLat;

pub type ReqId = String;
pub type VehId = String;

#[derive(Debug, Clone)]
pub struct Request {
    pub req_id: ReqId,
    pub origin: LonLat,
    pub destination: LonLat,
    pub t_request: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    Pickup,
    Dropoff,
    Rebalance,
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub kind: StopKind,
    pub req_id: Option<ReqId>,
    pub position: LonLat,
}

impl Stop {
    pub fn pickup(req_id: ReqId, position: LonLat) -> Self {
        Self {
            kind: StopKind::Pickup,
            req_id: Some(req_id),
            position,
        }
    }

    pub fn dropoff(req_id: ReqId, position: LonLat) -> Self {
        Self {
            kind: StopKind::Dropoff,
            req_id: Some(req_id),
            position,
        }
    }

    pub fn rebalance(position: LonLat) -> Self {
        Self {
            kind: StopKind::Rebalance,
            req_id: None,
            position,
        }
    }
}

/// Interpolation state for the leg a vehicle is currently mid-traversal on,
/// derived by the advancer and read only by track export. Never consulted
/// by feasibility or commit-guard logic (§3 supplemental note).
#[derive(Debug, Clone)]
pub struct ActivePath {
    pub from: LonLat,
    pub to: LonLat,
    pub elapsed_s: f64,
}

#[derive(Debug, Clone)]
pub struct VehicleState {
    pub veh_id: VehId,
    pub position: LonLat,
    pub schedule: Vec<Stop>,
    pub onboard: Vec<ReqId>,
    pub t_avail: f64,
    pub active_path: Option<ActivePath>,
}

impl VehicleState {
    pub fn new(veh_id: VehId, position: LonLat) -> Self {
        Self {
            veh_id,
            position,
            schedule: Vec::new(),
            onboard: Vec::new(),
            t_avail: 0.0,
            active_path: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.schedule.is_empty()
    }

    pub fn onboard_count(&self) -> usize {
        self.onboard.len()
    }
}

/// Transient result of the insertion evaluator: consumed by the commit
/// guard and never persisted.
#[derive(Debug, Clone)]
pub struct InsertionDecision {
    pub req_id: ReqId,
    pub veh_id: VehId,
    pub new_schedule: Vec<Stop>,
    pub cost_sec: f64,
}

/// Per-request retry bookkeeping, keyed by request in the orchestrator's
/// run state.
#[derive(Debug, Clone, Copy)]
pub struct PendingState {
    pub retry_idx: u32,
    pub late_eff: f64,
    pub deadline: f64,
}

/// Numerical slack applied uniformly to ETA comparisons (§4.2, §8 I3/I4).
pub const EPSILON: f64 = 1e-6;
