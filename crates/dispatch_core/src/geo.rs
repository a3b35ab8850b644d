//! Planar-approximate geometry and straight-line time fallbacks.
//!
//! These helpers back up the routing oracle (`crate::routing`) whenever the
//! real service is disabled or fails, and are also used directly by the
//! reactive rebalance pass for its idle-vehicle distance scoring.

/// A WGS84 coordinate, longitude first to match the OSRM convention used
/// throughout this crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points.
pub fn haversine_m(a: LonLat, b: LonLat) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let sin_lat = (dlat / 2.0).sin();
    let sin_lon = (dlon / 2.0).sin();
    let h = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Straight-line travel time in seconds at a constant fallback speed.
pub fn straight_line_seconds(a: LonLat, b: LonLat, avg_speed_kmh: f64) -> f64 {
    let mps = (avg_speed_kmh * 1000.0) / 3600.0;
    if mps <= 0.0 {
        return 0.0;
    }
    haversine_m(a, b) / mps
}

/// Cheap equirectangular approximation in meters, currently unused by the
/// oracle path (which rounds cache keys instead) but kept for callers that
/// want a fast planar distance without going through `RouteOracleHandle`.
pub fn equirect_m(a: LonLat, b: LonLat) -> f64 {
    let dx = (b.lon - a.lon) * 90_000.0;
    let dy = (b.lat - a.lat) * 111_000.0;
    (dx * dx + dy * dy).sqrt()
}

/// Linear interpolation between two points by fraction `frac` in [0, 1].
pub fn lerp(a: LonLat, b: LonLat, frac: f64) -> LonLat {
    let frac = frac.clamp(0.0, 1.0);
    LonLat {
        lon: a.lon + (b.lon - a.lon) * frac,
        lat: a.lat + (b.lat - a.lat) * frac,
    }
}

/// Key for the routing oracle's LRU cache: both endpoints rounded to six
/// decimal places, per the spec's cache-key requirement.
pub fn cache_key(o: LonLat, d: LonLat) -> (i64, i64, i64, i64) {
    let r = |v: f64| (v * 1_000_000.0).round() as i64;
    (r(o.lon), r(o.lat), r(d.lon), r(d.lat))
}
