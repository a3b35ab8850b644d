//! # DRT Batch-Tick Dispatcher Core
//!
//! A batch-tick dispatch engine for demand-responsive transit: a fleet of
//! shared vehicles is matched against a stream of timestamped ride
//! requests, advancing simulated time in fixed ticks.
//!
//! ## Overview
//!
//! This crate provides the core dispatch engine, including:
//!
//! - **Insertion search**: feasibility-checked pickup/dropoff insertion
//!   into a vehicle's existing schedule
//! - **Linear assignment**: Hungarian-algorithm resolution of per-tick
//!   vehicle/request contention
//! - **Commit guard**: re-validation against no-regression and capacity
//!   invariants immediately before a schedule is overwritten
//! - **Retry/rebalance**: progressively relaxed retry rounds and reactive
//!   pairing of idle vehicles with at-risk waiting requests
//! - **Routing oracle**: a cached adapter over an OSRM-compatible service
//!   with planar-approximation fallback
//!
//! ## Key Concepts
//!
//! - **Batch-tick**: all state changes are committed at fixed-size time
//!   steps, not as a continuous event stream
//! - **Sequential commit**: LAP pairs are applied one at a time, each
//!   re-validated against the vehicle's current (possibly already-mutated)
//!   schedule
//! - **Deterministic**: ties in insertion search and LAP are broken by
//!   scan order; only the rebalance pass draws from a seeded RNG
//!
//! ## Example
//!
//! ```rust,no_run
//! use dispatch_core::config::ServiceParams;
//! use dispatch_core::routing::RouteOracleHandle;
//! use dispatch_core::orchestrator::run;
//! use std::collections::HashMap;
//!
//! let params = ServiceParams::default();
//! let oracle = RouteOracleHandle::disabled(params.avg_speed_kmh);
//! let mut rng = rand::thread_rng();
//! let out = run(Vec::new(), HashMap::new(), &params, &oracle, &mut rng);
//! assert!(out.served.is_empty());
//! ```

pub mod geo;
pub mod routing;
pub mod model;
pub mod config;
pub mod sim;
pub mod insertion;
pub mod lap;
pub mod commit;
pub mod retry;
pub mod events;
pub mod rebalance;
pub mod advance;
pub mod orchestrator;
pub mod ingest;
pub mod fleet;
pub mod output;
