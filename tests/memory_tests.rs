//! Memory probe tests. This test binary runs on the counting allocator.

mod common;

use brrtbench::adapter::{
    AdapterBuildError, Handler, MatchitAdapter, RadixAdapter, RegexAdapter, RouterAdapter,
};
use brrtbench::memory::{
    is_installed, settle, AllocSnapshot, CountingAllocator, MemoryProbe, MemoryProbeError,
    MemorySample,
};
use brrtbench::spec::parse_api;
use brrtbench::translate::{translate_spec, Syntax, TranslatedRoute};
use common::catch_all_spec;
use std::alloc::System;
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

#[global_allocator]
static GLOBAL: CountingAllocator<System> = CountingAllocator::new(System);

fn probe() -> MemoryProbe {
    MemoryProbe::new(3, Duration::ZERO, 0.10)
}

#[test]
fn test_allocator_is_installed() {
    assert!(is_installed());
}

#[test]
fn test_snapshot_counts_this_thread() {
    let before = AllocSnapshot::current();
    let buf: Vec<u8> = black_box(Vec::with_capacity(4096));
    let after = AllocSnapshot::current();

    assert!(after.bytes_since(&before) >= 4096);
    assert!(after.allocs_since(&before) >= 1);
    drop(buf);
}

#[test]
fn test_sample_returns_to_baseline_after_drop() {
    let baseline = MemorySample::current();
    let buf: Vec<u64> = black_box(vec![7; 1024]);
    let held = MemorySample::current().delta_from(&baseline);
    drop(buf);
    let released = MemorySample::current().delta_from(&baseline);

    assert!(held.bytes >= 8 * 1024);
    assert!(held.objects >= 1);
    assert_eq!(released.bytes, 0);
    assert_eq!(released.objects, 0);
}

#[test]
fn test_other_threads_do_not_pollute_samples() {
    let baseline = MemorySample::current();
    std::thread::scope(|s| {
        s.spawn(|| {
            let leaked: Vec<u8> = black_box(vec![1; 1 << 16]);
            std::mem::forget(leaked);
        });
    });
    let delta = MemorySample::current().delta_from(&baseline);
    assert!(delta.bytes < 1 << 16, "{delta:?}");
}

#[test]
fn test_every_adapter_retains_memory_for_its_table() {
    let spec = parse_api();
    let adapters: [&dyn RouterAdapter; 3] = [&RadixAdapter, &RegexAdapter, &MatchitAdapter];
    for adapter in adapters {
        let table = translate_spec(&spec, adapter.name(), adapter.syntax());
        let m = probe().measure(adapter, &table).unwrap();
        assert_eq!(m.trials, 3);
        assert_eq!(m.deltas.len(), 3);
        assert!(m.median_bytes > 0, "{}", adapter.name());
        assert!(m.median_objects > 0, "{}", adapter.name());
        assert!(!m.clipped, "{}", adapter.name());
    }
}

#[test]
fn test_repeated_builds_are_within_tolerance() {
    let spec = parse_api();
    let adapters: [&dyn RouterAdapter; 3] = [&RadixAdapter, &RegexAdapter, &MatchitAdapter];
    for adapter in adapters {
        let table = translate_spec(&spec, adapter.name(), adapter.syntax());
        let first = probe().measure(adapter, &table).unwrap();
        let second = probe().measure(adapter, &table).unwrap();

        let larger = first.median_bytes.max(second.median_bytes) as f64;
        let diff = first.median_bytes.abs_diff(second.median_bytes) as f64;
        assert!(
            diff <= 0.10 * larger,
            "{}: {} vs {}",
            adapter.name(),
            first.median_bytes,
            second.median_bytes
        );
        assert!(!first.unreliable, "{}: {:?}", adapter.name(), first.deltas);
    }
}

#[test]
fn test_probe_measures_tables_with_exclusions() {
    let spec = catch_all_spec();
    let full = translate_spec(&spec, "regex", Syntax::BRACE);
    let m = probe().measure(&RegexAdapter, &full).unwrap();
    assert!(m.median_bytes > 0);

    let radix = translate_spec(&spec, "radix", RadixAdapter.syntax());
    assert_eq!(radix.effective_count(), 3);
    assert!(probe().measure(&RadixAdapter, &radix).unwrap().median_bytes > 0);
}

struct Refusing;

impl RouterAdapter for Refusing {
    fn name(&self) -> &'static str {
        "refusing"
    }

    fn syntax(&self) -> Syntax {
        Syntax::COLON
    }

    fn build(&self, routes: &[TranslatedRoute]) -> Result<Box<dyn Handler>, AdapterBuildError> {
        let route = &routes[0];
        Err(AdapterBuildError::Engine {
            adapter: self.name().to_string(),
            method: route.method.to_string(),
            pattern: route.pattern.clone(),
            reason: "not today".to_string(),
        })
    }
}

#[test]
fn test_build_failure_surfaces_as_probe_error() {
    let spec = parse_api();
    let table = translate_spec(&spec, "refusing", Syntax::COLON);
    let err = probe().measure(&Refusing, &table).unwrap_err();
    match err {
        MemoryProbeError::Build(inner) => assert!(!inner.is_harness_misuse()),
        other => panic!("expected build error, got {other:?}"),
    }
}

/// Counts every event that reaches the subscriber
struct EventCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for EventCounter {
    fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_settle_is_silent_inside_a_window() {
    let events = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(EventCounter(Arc::clone(&events)));

    tracing::subscriber::with_default(subscriber, || {
        let baseline = MemorySample::current();
        let advanced = settle(Duration::from_millis(1));
        let delta = MemorySample::current().delta_from(&baseline);

        assert!(advanced);
        assert_eq!(events.load(Ordering::SeqCst), 0);
        assert_eq!(delta.bytes, 0);
        assert_eq!(delta.objects, 0);

        // Trial events are emitted once both samples are taken
        let spec = parse_api();
        let table = translate_spec(&spec, "radix", RadixAdapter.syntax());
        MemoryProbe::new(2, Duration::ZERO, 0.10)
            .measure(&RadixAdapter, &table)
            .unwrap();
        assert!(events.load(Ordering::SeqCst) >= 2);
    });
}
