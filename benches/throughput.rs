use brrtbench::adapter::{build_handler, AdapterRegistry};
use brrtbench::config::ScenarioRequests;
use brrtbench::dispatcher::RequestDispatcher;
use brrtbench::scenario::ScenarioSet;
use brrtbench::spec::parse_api;
use brrtbench::translate::translate_spec;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

fn bench_dispatch(c: &mut Criterion) {
    let spec = parse_api();
    let scenarios =
        ScenarioSet::from_config(&spec, &ScenarioRequests::default()).expect("scenarios resolve");
    let registry = AdapterRegistry::with_defaults();

    let mut group = c.benchmark_group("dispatch");
    for adapter in registry.iter() {
        let table = translate_spec(&spec, adapter.name(), adapter.syntax());
        let handler = build_handler(adapter, &table).expect("adapter builds the Parse API");

        for prepared in scenarios.iter() {
            let requests = prepared.requests();
            group.throughput(Throughput::Elements(requests.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(adapter.name(), prepared.scenario),
                requests,
                |b, requests| {
                    let mut dispatcher = RequestDispatcher::new(handler.as_ref());
                    b.iter(|| {
                        dispatcher.run_operation(black_box(requests));
                    });
                    black_box(dispatcher.sink().total());
                },
            );
        }
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let spec = parse_api();
    let registry = AdapterRegistry::with_defaults();

    let mut group = c.benchmark_group("build");
    for adapter in registry.iter() {
        let table = translate_spec(&spec, adapter.name(), adapter.syntax());
        group.bench_function(adapter.name(), |b| {
            b.iter(|| black_box(adapter.build(&table.routes).expect("adapter builds")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_build);
criterion_main!(benches);
