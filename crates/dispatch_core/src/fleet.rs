//! Fleet initial placement (§6), grounded in the original source's
//! vehicle-init module: uniform-random placement within a bounding box
//! derived from observed requests, or placement sampled from the
//! request origin distribution. Both are seeded for reproducibility.

use crate::geo::LonLat;
use crate::model::{Request, VehId, VehicleState};
use rand::Rng;
use std::collections::HashMap;

const DISTRIBUTION_JITTER_DEG: f64 = 0.005;

fn bounding_box(requests: &[Request]) -> (f64, f64, f64, f64) {
    let mut lon_min = f64::INFINITY;
    let mut lon_max = f64::NEG_INFINITY;
    let mut lat_min = f64::INFINITY;
    let mut lat_max = f64::NEG_INFINITY;
    for r in requests {
        for p in [r.origin, r.destination] {
            lon_min = lon_min.min(p.lon);
            lon_max = lon_max.max(p.lon);
            lat_min = lat_min.min(p.lat);
            lat_max = lat_max.max(p.lat);
        }
    }
    if !lon_min.is_finite() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    (lon_min, lon_max, lat_min, lat_max)
}

/// Uniform-random placement within the bounding box of observed request
/// origins/destinations.
pub fn init_vehicles_random(
    requests: &[Request],
    fleet_size: usize,
    rng: &mut impl Rng,
) -> HashMap<VehId, VehicleState> {
    let (lon_min, lon_max, lat_min, lat_max) = bounding_box(requests);
    (0..fleet_size)
        .map(|i| {
            let veh_id = format!("v{i:03}");
            let lon = if lon_max > lon_min {
                rng.gen_range(lon_min..lon_max)
            } else {
                lon_min
            };
            let lat = if lat_max > lat_min {
                rng.gen_range(lat_min..lat_max)
            } else {
                lat_min
            };
            (
                veh_id.clone(),
                VehicleState::new(veh_id, LonLat::new(lon, lat)),
            )
        })
        .collect()
}

/// Placement sampled with replacement from request origins plus a small
/// jitter, falling back to `init_vehicles_random` when no requests are
/// available.
pub fn init_vehicles_from_request_distribution(
    requests: &[Request],
    fleet_size: usize,
    rng: &mut impl Rng,
) -> HashMap<VehId, VehicleState> {
    if requests.is_empty() {
        return init_vehicles_random(requests, fleet_size, rng);
    }
    (0..fleet_size)
        .map(|i| {
            let veh_id = format!("v{i:03}");
            let base = requests[rng.gen_range(0..requests.len())].origin;
            let lon = base.lon + rng.gen_range(-DISTRIBUTION_JITTER_DEG..DISTRIBUTION_JITTER_DEG);
            let lat = base.lat + rng.gen_range(-DISTRIBUTION_JITTER_DEG..DISTRIBUTION_JITTER_DEG);
            (
                veh_id.clone(),
                VehicleState::new(veh_id, LonLat::new(lon, lat)),
            )
        })
        .collect()
}
