//! Performance benchmarks for dispatch_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch_core::config::{EffectiveParams, ServiceParams};
use dispatch_core::fleet::init_vehicles_random;
use dispatch_core::geo::LonLat;
use dispatch_core::insertion::best_insertion_for_vehicle;
use dispatch_core::lap::{solve_lap, solve_lap_greedy};
use dispatch_core::model::{Request, VehicleState};
use dispatch_core::orchestrator::run;
use dispatch_core::routing::RouteOracleHandle;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn make_requests(n: usize, seed: u64) -> Vec<Request> {
    let mut rng = StdRng::seed_from_u64(seed);
    use rand::Rng;
    (0..n)
        .map(|i| Request {
            req_id: format!("r{i}"),
            origin: LonLat::new(127.10 + rng.gen_range(0.0..0.1), 37.45 + rng.gen_range(0.0..0.1)),
            destination: LonLat::new(127.10 + rng.gen_range(0.0..0.1), 37.45 + rng.gen_range(0.0..0.1)),
            t_request: (i as f64) * 5.0,
        })
        .collect()
}

fn bench_insertion_search(c: &mut Criterion) {
    let oracle = RouteOracleHandle::disabled(30.0);
    let effective = EffectiveParams {
        pickup_late_sec: 600.0,
        detour_ratio_max: 2.0,
    };

    let mut group = c.benchmark_group("insertion_search");
    for schedule_len in [0usize, 10, 40] {
        group.bench_with_input(
            BenchmarkId::from_parameter(schedule_len),
            &schedule_len,
            |b, &schedule_len| {
                let mut vehicle = VehicleState::new("v0".into(), LonLat::new(127.14, 37.48));
                for i in 0..schedule_len / 2 {
                    let id = format!("onboard{i}");
                    vehicle.onboard.push(id.clone());
                    vehicle
                        .schedule
                        .push(dispatch_core::model::Stop::dropoff(id, LonLat::new(127.15, 37.49)));
                }
                let request = Request {
                    req_id: "new".into(),
                    origin: LonLat::new(127.141, 37.481),
                    destination: LonLat::new(127.145, 37.485),
                    t_request: 0.0,
                };
                b.iter(|| {
                    black_box(best_insertion_for_vehicle(
                        &vehicle, &request, 0.0, 50, 30.0, 1e9, effective, None, None, None, &oracle,
                    ))
                });
            },
        );
    }
    group.finish();
}

fn bench_lap_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("lap_solver");
    for size in [10usize, 50, 150] {
        let cost: Vec<Vec<f64>> = (0..size)
            .map(|i| (0..size).map(|j| ((i * 7 + j * 13) % 97) as f64).collect())
            .collect();
        group.bench_with_input(BenchmarkId::new("hungarian", size), &cost, |b, cost| {
            b.iter(|| black_box(solve_lap(cost, 1e12)));
        });
        group.bench_with_input(BenchmarkId::new("greedy", size), &cost, |b, cost| {
            b.iter(|| black_box(solve_lap_greedy(cost, 1e12)));
        });
    }
    group.finish();
}

fn bench_orchestrator_run(c: &mut Criterion) {
    let scenarios = vec![("small", 20, 50), ("medium", 50, 150)];

    let mut group = c.benchmark_group("orchestrator_run");
    for (name, fleet, requests) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(fleet, requests),
            |b, &(fleet, requests)| {
                b.iter(|| {
                    let reqs = make_requests(requests, 42);
                    let mut rng = StdRng::seed_from_u64(1);
                    let vehicles = init_vehicles_random(&reqs, fleet, &mut rng);
                    let params = ServiceParams::default().with_batch_seconds(60.0);
                    let oracle = RouteOracleHandle::disabled(30.0);
                    black_box(run(reqs, vehicles, &params, &oracle, &mut rng));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insertion_search,
    bench_lap_solver,
    bench_orchestrator_run
);
criterion_main!(benches);
