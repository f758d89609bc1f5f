use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use routeprof::{assemble, merge, RawSample, Route, RouteId, Stage};

fn route(id: u64, end_measure: f64) -> Route {
    Route {
        id: RouteId(id),
        stage: Stage::new("1"),
        segment_group: None,
        system: None,
        begin_measure: 0.0,
        end_measure,
    }
}

/// Samples every 10 ft, in reverse order with every tenth repeated.
fn samples(len: usize) -> Vec<RawSample> {
    (0..len)
        .rev()
        .flat_map(|i| {
            let sample = RawSample::new(i as f64 * 10.0, Some(300.0 + (i % 37) as f64 * 0.125));
            let repeats = if i % 10 == 0 { 2 } else { 1 };
            std::iter::repeat(sample).take(repeats)
        })
        .collect()
}

fn assemble_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("Assemble");
    for len in [100, 10_000] {
        let route = route(1, len as f64 * 10.0);
        let samples = samples(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &samples, |b, s| {
            b.iter(|| assemble(&route, s))
        });
    }
}

fn merge_routes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Merge");
    let series: Vec<_> = (0..200)
        .rev()
        .map(|id| assemble(&route(id, 5_000.0), &samples(500)))
        .collect();
    group.bench_function("200 routes", |b| b.iter(|| merge(series.clone())));
}

criterion_group!(benches, assemble_route, merge_routes);
criterion_main!(benches);
