//! Routing oracle adapter: a thin interface over an OSRM-compatible HTTP
//! service, with an in-memory LRU cache and a straight-line fallback.
//!
//! Mirrors the shape of the teacher's `RouteProvider` trait and
//! `CachedRouteProvider` wrapper, adapted from H3-cell routing to
//! continuous WGS84 coordinates.

mod osrm;

pub use osrm::OsrmOracle;

use crate::geo::{self, LonLat};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

/// Default HTTP timeout for oracle calls, per the spec's §5 resource model.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default LRU cache capacity, sized generously since cache entries are
/// four `i64`s and one `f64`/`Vec<LonLat>`.
pub const DEFAULT_CACHE_CAPACITY: usize = 50_000;

/// Interface a routing backend must provide. Implementors are expected to
/// return `None` on any failure (timeout, non-200, empty `routes`); callers
/// fall back to the planar approximations in `crate::geo`.
pub trait RoutingOracle: Send + Sync {
    fn oneway_duration(&self, o: LonLat, d: LonLat) -> Option<f64>;

    /// Per-leg durations along `points`. The default sums `oneway_duration`
    /// leg by leg; a real backend may override this with a single batched
    /// call (OSRM `/route` with multiple waypoints, or `/table`).
    fn leg_durations(&self, points: &[LonLat]) -> Option<Vec<f64>> {
        if points.len() < 2 {
            return Some(Vec::new());
        }
        let mut out = Vec::with_capacity(points.len() - 1);
        for pair in points.windows(2) {
            out.push(self.oneway_duration(pair[0], pair[1])?);
        }
        Some(out)
    }

    /// Position reached after `elapsed_s` seconds along the start→end route.
    fn progress_point(&self, start: LonLat, end: LonLat, elapsed_s: f64) -> Option<LonLat>;
}

/// A backend that always fails; used when `use_osrm=false`. The evaluator,
/// advancer, and rebalance pass fall back to planar approximations.
pub struct NullOracle;

impl RoutingOracle for NullOracle {
    fn oneway_duration(&self, _o: LonLat, _d: LonLat) -> Option<f64> {
        None
    }
    fn progress_point(&self, _start: LonLat, _end: LonLat, _elapsed_s: f64) -> Option<LonLat> {
        None
    }
}

struct CacheState {
    duration: LruCache<(i64, i64, i64, i64), f64>,
}

/// Wraps a `RoutingOracle` with an LRU cache and the planar-approximation
/// fallback, and tracks which distinct failures have already been warned
/// about so repeated failures for the same OD pair do not flood stderr.
pub struct RouteOracleHandle {
    backend: Box<dyn RoutingOracle>,
    avg_speed_kmh: f64,
    cache: Mutex<CacheState>,
    warned: Mutex<std::collections::HashSet<(i64, i64, i64, i64)>>,
}

impl RouteOracleHandle {
    pub fn new(backend: Box<dyn RoutingOracle>, avg_speed_kmh: f64) -> Self {
        Self::with_capacity(backend, avg_speed_kmh, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(backend: Box<dyn RoutingOracle>, avg_speed_kmh: f64, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            backend,
            avg_speed_kmh,
            cache: Mutex::new(CacheState {
                duration: LruCache::new(capacity),
            }),
            warned: Mutex::new(std::collections::HashSet::new()),
        }
    }

    pub fn disabled(avg_speed_kmh: f64) -> Self {
        Self::new(Box::new(NullOracle), avg_speed_kmh)
    }

    fn warn_once(&self, key: (i64, i64, i64, i64), context: &str) {
        let mut warned = self.warned.lock().unwrap();
        if warned.insert(key) {
            eprintln!("routing oracle failure ({context}); falling back to straight-line time");
        }
    }

    /// One-way duration, cached, falling back to the straight-line estimate
    /// on any backend failure.
    pub fn oneway_duration_or_fallback(&self, o: LonLat, d: LonLat) -> f64 {
        let key = geo::cache_key(o, d);
        if let Some(&cached) = self.cache.lock().unwrap().duration.peek(&key) {
            return cached;
        }
        if let Some(sec) = self.backend.oneway_duration(o, d) {
            self.cache.lock().unwrap().duration.put(key, sec);
            return sec;
        }
        self.warn_once(key, "oneway_duration");
        geo::straight_line_seconds(o, d, self.avg_speed_kmh)
    }

    /// Per-leg durations, falling back leg-by-leg on backend failure.
    pub fn leg_durations_or_fallback(&self, points: &[LonLat]) -> Vec<f64> {
        if let Some(legs) = self.backend.leg_durations(points) {
            return legs;
        }
        points
            .windows(2)
            .map(|pair| self.oneway_duration_or_fallback(pair[0], pair[1]))
            .collect()
    }

    /// Position reached after `elapsed_s` seconds, falling back to linear
    /// interpolation scaled by the straight-line travel time.
    pub fn progress_point_or_fallback(&self, start: LonLat, end: LonLat, elapsed_s: f64) -> LonLat {
        if let Some(p) = self.backend.progress_point(start, end, elapsed_s) {
            return p;
        }
        let total = geo::straight_line_seconds(start, end, self.avg_speed_kmh);
        let frac = if total > 0.0 { elapsed_s / total } else { 1.0 };
        geo::lerp(start, end, frac)
    }

    pub fn avg_speed_kmh(&self) -> f64 {
        self.avg_speed_kmh
    }
}
