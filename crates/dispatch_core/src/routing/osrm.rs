//! HTTP client for an OSRM-compatible routing service.

use super::{RoutingOracle, DEFAULT_TIMEOUT};
use crate::geo::LonLat;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
    geometry: Option<OsrmGeometry>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

pub struct OsrmOracle {
    base_url: String,
    profile: String,
    client: reqwest::blocking::Client,
}

impl OsrmOracle {
    pub fn new(base_url: impl Into<String>, profile: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("reqwest client build");
        Self {
            base_url: base_url.into(),
            profile: profile.into(),
            client,
        }
    }

    fn route_url(&self, points: &[LonLat], with_geometry: bool) -> String {
        let coords = points
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        let overview = if with_geometry { "full" } else { "false" };
        format!(
            "{}/route/v1/{}/{}?overview={}&geometries=geojson",
            self.base_url.trim_end_matches('/'),
            self.profile,
            coords,
            overview,
        )
    }

    fn fetch_route(&self, points: &[LonLat], with_geometry: bool) -> Option<OsrmRoute> {
        let url = self.route_url(points, with_geometry);
        let resp = self.client.get(&url).send().ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let parsed: OsrmResponse = resp.json().ok()?;
        if parsed.code != "Ok" || parsed.routes.is_empty() {
            return None;
        }
        parsed.routes.into_iter().next()
    }
}

impl RoutingOracle for OsrmOracle {
    fn oneway_duration(&self, o: LonLat, d: LonLat) -> Option<f64> {
        self.fetch_route(&[o, d], false).map(|r| r.duration)
    }

    fn leg_durations(&self, points: &[LonLat]) -> Option<Vec<f64>> {
        if points.len() < 2 {
            return Some(Vec::new());
        }
        let route = self.fetch_route(points, false)?;
        if route.legs.len() == points.len() - 1 {
            Some(route.legs.into_iter().map(|l| l.duration).collect())
        } else {
            None
        }
    }

    fn progress_point(&self, start: LonLat, end: LonLat, elapsed_s: f64) -> Option<LonLat> {
        let route = self.fetch_route(&[start, end], true)?;
        let geometry = route.geometry?;
        if geometry.coordinates.is_empty() || route.duration <= 0.0 {
            return None;
        }
        if elapsed_s <= 0.0 {
            let [lon, lat] = geometry.coordinates[0];
            return Some(LonLat::new(lon, lat));
        }
        if elapsed_s >= route.duration {
            let [lon, lat] = *geometry.coordinates.last().unwrap();
            return Some(LonLat::new(lon, lat));
        }
        let n = geometry.coordinates.len();
        let per_seg = route.duration / (n.saturating_sub(1).max(1) as f64);
        let idx = ((elapsed_s / per_seg).floor() as usize).min(n.saturating_sub(2));
        let frac = (elapsed_s - idx as f64 * per_seg) / per_seg;
        let [lon1, lat1] = geometry.coordinates[idx];
        let [lon2, lat2] = geometry.coordinates[idx + 1];
        Some(crate::geo::lerp(
            LonLat::new(lon1, lat1),
            LonLat::new(lon2, lat2),
            frac,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_url_contains_coordinates_and_profile() {
        let oracle = OsrmOracle::new("http://localhost:5000", "driving");
        let url = oracle.route_url(
            &[LonLat::new(127.14, 37.48), LonLat::new(127.15, 37.49)],
            false,
        );
        assert!(url.contains("127.140000,37.480000"));
        assert!(url.contains("/driving/"));
    }
}
