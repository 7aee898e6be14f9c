use super::alloc::{is_installed, AllocSnapshot};
use crate::adapter::{build_handler, AdapterBuildError, RouterAdapter};
use crate::config::BenchConfig;
use crate::translate::TranslatedTable;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Live heap of the calling thread at a quiescent point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemorySample {
    /// Bytes allocated and not yet freed
    pub allocated_bytes: i64,
    /// Allocations not yet freed
    pub live_objects: i64,
}

impl MemorySample {
    /// Sample the calling thread's counters
    #[must_use]
    pub fn current() -> Self {
        let snapshot = AllocSnapshot::current();
        Self {
            allocated_bytes: snapshot.live_bytes(),
            live_objects: snapshot.live_objects(),
        }
    }

    /// Field-wise `self - baseline`
    #[must_use]
    pub fn delta_from(&self, baseline: &MemorySample) -> MemoryDelta {
        MemoryDelta {
            bytes: self.allocated_bytes - baseline.allocated_bytes,
            objects: self.live_objects - baseline.live_objects,
        }
    }
}

/// Raw difference between two samples; either field may be negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryDelta {
    /// Byte delta
    pub bytes: i64,
    /// Object delta
    pub objects: i64,
}

/// Summary of all trials for one adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryMeasurement {
    /// Number of trials run
    pub trials: u32,
    /// Median retained bytes
    pub median_bytes: u64,
    /// Median retained objects
    pub median_objects: u64,
    /// Smallest byte delta after clipping
    pub min_bytes: u64,
    /// Largest byte delta after clipping
    pub max_bytes: u64,
    /// `max_bytes - min_bytes`
    pub spread_bytes: u64,
    /// Spread exceeded the variance threshold
    pub unreliable: bool,
    /// At least one negative delta was clipped to zero
    pub clipped: bool,
    /// Per-trial deltas as sampled, before clipping
    pub deltas: Vec<MemoryDelta>,
}

/// Memory probe failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryProbeError {
    /// The process does not run on a [`CountingAllocator`](super::CountingAllocator)
    AllocatorNotInstalled,
    /// The adapter could not build its table
    Build(AdapterBuildError),
}

impl fmt::Display for MemoryProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryProbeError::AllocatorNotInstalled => write!(
                f,
                "counting allocator is not installed as the global allocator; memory not measured"
            ),
            MemoryProbeError::Build(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for MemoryProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MemoryProbeError::Build(err) => Some(err),
            MemoryProbeError::AllocatorNotInstalled => None,
        }
    }
}

impl From<AdapterBuildError> for MemoryProbeError {
    fn from(err: AdapterBuildError) -> Self {
        MemoryProbeError::Build(err)
    }
}

/// Let the allocator reach a quiescent state.
///
/// Emits nothing, so it is safe inside a measurement window. Returns `false` when the
/// jemalloc statistics epoch could not be advanced.
#[must_use]
pub fn settle(interval: Duration) -> bool {
    #[cfg(feature = "jemalloc")]
    let advanced = tikv_jemalloc_ctl::epoch::advance().is_ok();
    #[cfg(not(feature = "jemalloc"))]
    let advanced = true;

    if !interval.is_zero() {
        std::thread::sleep(interval);
    }
    advanced
}

fn median(sorted: &[u64]) -> u64 {
    match sorted.len() {
        0 => 0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2,
    }
}

/// Reduce raw trial deltas to a [`MemoryMeasurement`].
///
/// Negative deltas are clipped to zero. The measurement is unreliable when the byte
/// spread exceeds `variance_threshold` times the median (any spread at all when the
/// median is zero).
#[must_use]
pub fn summarize_trials(deltas: &[MemoryDelta], variance_threshold: f64) -> MemoryMeasurement {
    let clipped = deltas.iter().any(|d| d.bytes < 0 || d.objects < 0);

    let mut bytes: Vec<u64> = deltas.iter().map(|d| d.bytes.max(0) as u64).collect();
    let mut objects: Vec<u64> = deltas.iter().map(|d| d.objects.max(0) as u64).collect();
    bytes.sort_unstable();
    objects.sort_unstable();

    let median_bytes = median(&bytes);
    let min_bytes = bytes.first().copied().unwrap_or(0);
    let max_bytes = bytes.last().copied().unwrap_or(0);
    let spread_bytes = max_bytes - min_bytes;

    let unreliable = if median_bytes == 0 {
        spread_bytes > 0
    } else {
        spread_bytes as f64 > variance_threshold * median_bytes as f64
    };

    MemoryMeasurement {
        trials: deltas.len() as u32,
        median_bytes,
        median_objects: median(&objects),
        min_bytes,
        max_bytes,
        spread_bytes,
        unreliable,
        clipped,
        deltas: deltas.to_vec(),
    }
}

/// Runs the build-retention trials for one adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryProbe {
    trials: u32,
    settle: Duration,
    variance_threshold: f64,
}

impl MemoryProbe {
    /// Probe running `trials` trials with `settle` quiescence waits
    #[must_use]
    pub fn new(trials: u32, settle: Duration, variance_threshold: f64) -> Self {
        Self {
            trials: trials.max(1),
            settle,
            variance_threshold,
        }
    }

    /// Probe configured from [`BenchConfig`]
    #[must_use]
    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(
            config.memory_trials,
            Duration::from_millis(config.settle_ms),
            config.variance_threshold,
        )
    }

    /// Configured trial count
    #[must_use]
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Measure the heap retained by `adapter`'s table for `table`.
    ///
    /// One untimed build runs first. It validates the table through
    /// [`build_handler`] and absorbs one-time lazy initialization inside the engine,
    /// so every measured trial sees the same process state.
    ///
    /// # Errors
    ///
    /// [`MemoryProbeError::AllocatorNotInstalled`] without a counting allocator,
    /// [`MemoryProbeError::Build`] when the adapter cannot build the table.
    pub fn measure(
        &self,
        adapter: &dyn RouterAdapter,
        table: &TranslatedTable,
    ) -> Result<MemoryMeasurement, MemoryProbeError> {
        if !is_installed() {
            return Err(MemoryProbeError::AllocatorNotInstalled);
        }

        drop(build_handler(adapter, table)?);

        let mut deltas = Vec::with_capacity(self.trials as usize);
        for _ in 0..self.trials {
            deltas.push(self.trial(adapter, table)?);
        }

        let measurement = summarize_trials(&deltas, self.variance_threshold);
        debug!(
            adapter = adapter.name(),
            trials = measurement.trials,
            median_bytes = measurement.median_bytes,
            median_objects = measurement.median_objects,
            spread_bytes = measurement.spread_bytes,
            "Memory measured"
        );
        if measurement.unreliable {
            warn!(
                adapter = adapter.name(),
                spread_bytes = measurement.spread_bytes,
                median_bytes = measurement.median_bytes,
                threshold = self.variance_threshold,
                "Memory trials exceed variance threshold"
            );
        }
        if measurement.clipped {
            warn!(adapter = adapter.name(), "Negative memory delta clipped to zero");
        }
        Ok(measurement)
    }

    fn trial(
        &self,
        adapter: &dyn RouterAdapter,
        table: &TranslatedTable,
    ) -> Result<MemoryDelta, MemoryProbeError> {
        let settled_before = settle(self.settle);
        let baseline = MemorySample::current();

        // The handler stays alive until the post-build sample is taken
        let handler = adapter.build(&table.routes)?;
        let settled_after = settle(self.settle);
        let after = MemorySample::current();
        drop(handler);

        trace!(
            adapter = adapter.name(),
            settle_ms = self.settle.as_millis() as u64,
            epoch_advanced = settled_before && settled_after,
            "Memory trial sampled"
        );
        Ok(after.delta_from(&baseline))
    }
}
