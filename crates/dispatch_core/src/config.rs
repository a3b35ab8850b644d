//! Run configuration. Mirrors the teacher's `ScenarioParams`/`*Config`
//! resource style: a plain struct with a documented `Default` and
//! `with_*` builder methods for the options most often overridden.

#[derive(Debug, Clone)]
pub struct ServiceParams {
    pub batch_seconds: f64,
    pub service_time_sec: f64,
    pub vehicle_capacity: u32,
    pub pickup_early_sec: f64,
    pub pickup_late_sec: f64,
    pub detour_ratio_max: f64,
    pub max_ride_time_sec: Option<f64>,
    pub use_osrm: bool,
    pub osrm_base_url: String,
    pub osrm_profile: String,
    pub avg_speed_kmh: f64,
    pub insert_pick_window: Option<usize>,
    pub insert_drop_window: Option<usize>,
    pub enable_rebalance: bool,
    pub max_retries: u32,
    pub wait_bonus_per_retry_sec: f64,
    pub wait_bonus_cap_sec: f64,
    pub detour_bonus_per_retry: f64,
    pub detour_bonus_cap: f64,
    pub fleet_size: usize,
    pub big_m: f64,
    pub tail_flush_max_sec: f64,
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self {
            batch_seconds: 60.0,
            service_time_sec: 30.0,
            vehicle_capacity: 4,
            pickup_early_sec: 0.0,
            pickup_late_sec: 600.0,
            detour_ratio_max: 2.0,
            max_ride_time_sec: None,
            use_osrm: false,
            osrm_base_url: "http://localhost:5000".to_string(),
            osrm_profile: "driving".to_string(),
            avg_speed_kmh: 30.0,
            insert_pick_window: None,
            insert_drop_window: None,
            enable_rebalance: true,
            max_retries: 3,
            wait_bonus_per_retry_sec: 180.0,
            wait_bonus_cap_sec: 900.0,
            detour_bonus_per_retry: 0.2,
            detour_bonus_cap: 3.0,
            fleet_size: 50,
            big_m: 1e12,
            tail_flush_max_sec: 3600.0,
        }
    }
}

impl ServiceParams {
    pub fn with_batch_seconds(mut self, secs: f64) -> Self {
        self.batch_seconds = secs;
        self
    }

    pub fn with_vehicle_capacity(mut self, cap: u32) -> Self {
        self.vehicle_capacity = cap;
        self
    }

    pub fn with_pickup_late_sec(mut self, secs: f64) -> Self {
        self.pickup_late_sec = secs;
        self
    }

    pub fn with_detour_ratio_max(mut self, ratio: f64) -> Self {
        self.detour_ratio_max = ratio;
        self
    }

    pub fn with_max_ride_time_sec(mut self, secs: f64) -> Self {
        self.max_ride_time_sec = Some(secs);
        self
    }

    pub fn with_osrm(mut self, base_url: impl Into<String>, profile: impl Into<String>) -> Self {
        self.use_osrm = true;
        self.osrm_base_url = base_url.into();
        self.osrm_profile = profile.into();
        self
    }

    pub fn with_fleet_size(mut self, n: usize) -> Self {
        self.fleet_size = n;
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_enable_rebalance(mut self, enabled: bool) -> Self {
        self.enable_rebalance = enabled;
        self
    }

    /// Retry-relaxed view of this configuration, per §4.4.
    pub fn relax(&self, retry_idx: u32) -> EffectiveParams {
        let k = retry_idx as f64;
        EffectiveParams {
            pickup_late_sec: self.pickup_late_sec
                + (self.wait_bonus_per_retry_sec * k).min(self.wait_bonus_cap_sec),
            detour_ratio_max: (self.detour_ratio_max + self.detour_bonus_per_retry * k)
                .min(self.detour_bonus_cap),
        }
    }
}

/// The subset of `ServiceParams` that varies per retry round (§4.4).
#[derive(Debug, Clone, Copy)]
pub struct EffectiveParams {
    pub pickup_late_sec: f64,
    pub detour_ratio_max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_satisfies_spec_constraints() {
        let p = ServiceParams::default();
        assert!(p.big_m >= 1e12);
        assert_eq!(p.pickup_early_sec, 0.0);
    }

    #[test]
    fn relax_applies_wait_bonus_with_cap() {
        let p = ServiceParams::default();
        let eff0 = p.relax(0);
        assert_eq!(eff0.pickup_late_sec, p.pickup_late_sec);
        let eff1 = p.relax(1);
        assert_eq!(eff1.pickup_late_sec, p.pickup_late_sec + 180.0);
        let eff_many = p.relax(100);
        assert_eq!(
            eff_many.pickup_late_sec,
            p.pickup_late_sec + p.wait_bonus_cap_sec
        );
    }

    #[test]
    fn relax_applies_detour_bonus_with_cap() {
        let p = ServiceParams::default();
        let eff = p.relax(1);
        assert_eq!(eff.detour_ratio_max, p.detour_ratio_max + 0.2);
        let eff_many = p.relax(1000);
        assert_eq!(eff_many.detour_ratio_max, p.detour_bonus_cap);
    }
}
