//! # Memory Module
//!
//! Heap accounting for route-table construction.
//!
//! ## Overview
//!
//! Route tables are measured with allocation counters, not process RSS: RSS moves in
//! page-sized steps and includes everything else the process did. The module provides
//!
//! - [`CountingAllocator`]: a `GlobalAlloc` wrapper that counts allocations and bytes per thread
//! - [`MemorySample`]: a quiescent reading of the calling thread's live heap
//! - [`MemoryProbe`]: the trial protocol that brackets one adapter build
//! - [`resident_bytes`]: process resident memory for the report footer
//!
//! ## Measurement protocol
//!
//! For each trial the probe settles the allocator, samples, builds the handler, settles again,
//! samples, and only then drops the handler. The delta of the two samples is the table's cost.
//! The median over all trials is reported; a spread above the variance threshold marks the
//! measurement unreliable, and negative deltas are clipped to zero and flagged.
//!
//! ## Allocator settling
//!
//! There is no collector to force. Settling advances the jemalloc statistics epoch when the
//! `jemalloc` feature is enabled and then sleeps for the configured interval.

mod alloc;
mod probe;

pub use alloc::{is_installed, AllocSnapshot, CountingAllocator};
pub use probe::{
    settle, summarize_trials, MemoryDelta, MemoryMeasurement, MemoryProbe, MemoryProbeError,
    MemorySample,
};

/// Resident set size of the process in bytes, when the platform reports it
#[must_use]
pub fn resident_bytes() -> Option<u64> {
    memory_stats::memory_stats().map(|usage| usage.physical_mem as u64)
}

/// Bytes currently allocated through jemalloc, when the `jemalloc` feature is enabled
#[must_use]
pub fn allocator_allocated_bytes() -> Option<u64> {
    #[cfg(feature = "jemalloc")]
    {
        if tikv_jemalloc_ctl::epoch::advance().is_err() {
            return None;
        }
        tikv_jemalloc_ctl::stats::allocated::read()
            .ok()
            .map(|bytes| bytes as u64)
    }
    #[cfg(not(feature = "jemalloc"))]
    {
        None
    }
}
