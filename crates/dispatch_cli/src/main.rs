use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use dispatch_core::config::ServiceParams;
use dispatch_core::fleet;
use dispatch_core::ingest::{load_requests_parquet, IngestOptions};
use dispatch_core::orchestrator;
use dispatch_core::output::write_all;
use dispatch_core::routing::{OsrmOracle, RouteOracleHandle};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Runs one batch-tick dispatch simulation over a parquet request table and
/// writes the resulting event/move/track/reroute/attempt streams as JSON.
#[derive(Parser)]
#[command(
    name = "dispatch",
    about = "Batch-tick demand-responsive transit dispatcher",
    long_about = "Loads ride requests from a parquet file, simulates a fleet of\n\
                  vehicles against them with a rolling-horizon batch-assignment\n\
                  dispatcher, and writes the run's events, moves, tracks, reroutes,\n\
                  and per-request attempts as JSON."
)]
struct Cli {
    /// Parquet file of ride requests (auto-mapped id/time/origin/destination columns)
    input: PathBuf,

    /// Directory to write summary.json, events.json, moves.json, tracks.json,
    /// reroutes.json, and attempts.json into
    #[arg(long, default_value = "out")]
    output_dir: PathBuf,

    /// Number of vehicles in the fleet
    #[arg(long, default_value_t = 50)]
    fleet_size: usize,

    /// Batch tick length in seconds
    #[arg(long, default_value_t = 60.0)]
    batch_seconds: f64,

    /// Passenger capacity per vehicle
    #[arg(long, default_value_t = 4)]
    vehicle_capacity: u32,

    /// Base allowed pickup lateness in seconds, before retry relaxation
    #[arg(long, default_value_t = 600.0)]
    pickup_late_sec: f64,

    /// Base allowed detour ratio, before retry relaxation
    #[arg(long, default_value_t = 2.0)]
    detour_ratio_max: f64,

    /// Maximum in-vehicle ride time in seconds; unset disables the cap
    #[arg(long)]
    max_ride_time_sec: Option<f64>,

    /// Maximum number of retry/relaxation rounds before a request is rejected
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Disable the reactive rebalance pass
    #[arg(long)]
    no_rebalance: bool,

    /// Seconds past the last request's arrival during which vehicles may
    /// still be advanced to complete in-progress trips
    #[arg(long, default_value_t = 3600.0)]
    tail_flush_max_sec: f64,

    /// OSRM server base URL; when set, routes are queried from OSRM instead
    /// of the straight-line fallback
    #[arg(long)]
    osrm_base_url: Option<String>,

    /// OSRM routing profile
    #[arg(long, default_value = "driving")]
    osrm_profile: String,

    /// Fallback straight-line speed in km/h, used whenever the routing
    /// oracle is disabled or a lookup fails
    #[arg(long, default_value_t = 30.0)]
    avg_speed_kmh: f64,

    /// Place initial vehicle positions sampled from the request origin
    /// distribution instead of uniformly within the bounding box
    #[arg(long)]
    placement_from_requests: bool,

    /// RNG seed for vehicle placement and rebalance tie-breaking
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Only load requests with `t_request` at or after this value (seconds)
    #[arg(long)]
    sim_start_sec: Option<f64>,

    /// Only load requests with `t_request` at or before this value (seconds)
    #[arg(long)]
    sim_end_sec: Option<f64>,

    /// Cap the number of loaded requests to this many
    #[arg(long)]
    limit_n: Option<usize>,

    /// When combined with `--limit-n`, sample randomly instead of taking
    /// the first N requests after sorting
    #[arg(long)]
    limit_random: bool,
}

fn build_params(cli: &Cli) -> ServiceParams {
    let mut params = ServiceParams::default()
        .with_fleet_size(cli.fleet_size)
        .with_batch_seconds(cli.batch_seconds)
        .with_vehicle_capacity(cli.vehicle_capacity)
        .with_pickup_late_sec(cli.pickup_late_sec)
        .with_detour_ratio_max(cli.detour_ratio_max)
        .with_max_retries(cli.max_retries)
        .with_enable_rebalance(!cli.no_rebalance);
    if let Some(secs) = cli.max_ride_time_sec {
        params = params.with_max_ride_time_sec(secs);
    }
    if let Some(base_url) = &cli.osrm_base_url {
        params = params.with_osrm(base_url.clone(), cli.osrm_profile.clone());
    }
    params.avg_speed_kmh = cli.avg_speed_kmh;
    params.tail_flush_max_sec = cli.tail_flush_max_sec;
    params
}

fn build_oracle(params: &ServiceParams) -> RouteOracleHandle {
    if params.use_osrm {
        let backend = OsrmOracle::new(params.osrm_base_url.clone(), params.osrm_profile.clone());
        RouteOracleHandle::new(Box::new(backend), params.avg_speed_kmh)
    } else {
        RouteOracleHandle::disabled(params.avg_speed_kmh)
    }
}

fn main() {
    let cli = Cli::parse();
    let params = build_params(&cli);

    let ingest_opts = IngestOptions {
        sim_start_sec: cli.sim_start_sec,
        sim_end_sec: cli.sim_end_sec,
        limit_n: cli.limit_n,
        limit_random: cli.limit_random,
        limit_seed: cli.seed,
    };

    eprintln!("loading requests from {}", cli.input.display());
    let requests = match load_requests_parquet(&cli.input, &ingest_opts) {
        Ok(requests) => requests,
        Err(err) => {
            eprintln!("failed to load requests: {err}");
            exit(1);
        }
    };
    eprintln!("loaded {} requests", requests.len());

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let vehicles = if cli.placement_from_requests {
        fleet::init_vehicles_from_request_distribution(&requests, cli.fleet_size, &mut rng)
    } else {
        fleet::init_vehicles_random(&requests, cli.fleet_size, &mut rng)
    };
    eprintln!("placed {} vehicles", vehicles.len());

    let oracle = build_oracle(&params);
    let out = orchestrator::run(requests, vehicles, &params, &oracle, &mut rng);

    if let Err(err) = std::fs::create_dir_all(&cli.output_dir) {
        eprintln!("failed to create output directory: {err}");
        exit(1);
    }
    write_all(&cli.output_dir, &out);

    eprintln!(
        "\ndone: {} served, {} rejected ({} events, {} moves, {} reroutes)",
        out.served.len(),
        out.rejected.len(),
        out.events.len(),
        out.moves.len(),
        out.reroutes.len(),
    );
}
