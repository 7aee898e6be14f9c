//! # Report Module
//!
//! Collects every measurement of a run and renders it as text or JSON.
//!
//! The text layout is fixed: header, memory section, results table, then exclusions,
//! dispatch mismatches, warnings and skipped adapters. Adapters appear in registration
//! order and scenarios in run order, so two reports of the same run diff cleanly.

use crate::adapter::SkippedAdapter;
use crate::config::BenchConfig;
use crate::memory::MemoryMeasurement;
use crate::scenario::{DispatchMismatch, ScenarioResult};
use crate::translate::UnsupportedPatternError;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain-text tables
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Run settings echoed into the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSettings {
    /// Untimed operations before each timed region
    pub warmup: u64,
    /// Timed operations per adapter and scenario
    pub iterations: u64,
    /// Batches the timed operations were split into
    pub samples: u64,
    /// Memory trials per adapter
    pub memory_trials: u32,
    /// Allocator settle interval in milliseconds
    pub settle_ms: u64,
    /// Relative spread that flags a measurement
    pub variance_threshold: f64,
}

impl From<&BenchConfig> for RunSettings {
    fn from(config: &BenchConfig) -> Self {
        Self {
            warmup: config.warmup,
            iterations: config.iterations,
            samples: config.samples,
            memory_trials: config.memory_trials,
            settle_ms: config.settle_ms,
            variance_threshold: config.variance_threshold,
        }
    }
}

/// Everything measured for one adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterReport {
    /// Adapter name
    pub adapter: String,
    /// Routes the adapter registered
    pub effective_routes: usize,
    /// Routes in the canonical table
    pub canonical_routes: usize,
    /// Routes the adapter's syntax could not express
    pub excluded: Vec<UnsupportedPatternError>,
    /// Route-table memory, when it could be measured
    pub memory: Option<MemoryMeasurement>,
    /// Why memory is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_error: Option<String>,
    /// Scenario results in run order
    pub results: Vec<ScenarioResult>,
    /// Sanity-pass disagreements
    pub mismatches: Vec<DispatchMismatch>,
}

/// Ordered results of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Route table name
    pub route_spec: String,
    /// Canonical route count
    pub canonical_routes: usize,
    /// Settings the run used
    pub settings: RunSettings,
    /// Measured adapters in registration order
    pub adapters: Vec<AdapterReport>,
    /// Adapters left out, with reasons
    pub skipped: Vec<SkippedAdapter>,
    /// Low-confidence and correctness notes
    pub warnings: Vec<String>,
    /// Process resident memory at the end of the run
    pub resident_bytes: Option<u64>,
    /// jemalloc allocated bytes at the end of the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocator_bytes: Option<u64>,
}

impl Report {
    /// Empty report for `route_spec`
    #[must_use]
    pub fn new(
        route_spec: impl Into<String>,
        canonical_routes: usize,
        settings: RunSettings,
    ) -> Self {
        Self {
            route_spec: route_spec.into(),
            canonical_routes,
            settings,
            adapters: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            resident_bytes: None,
            allocator_bytes: None,
        }
    }

    /// Report for `adapter`, if it was measured
    #[must_use]
    pub fn adapter(&self, adapter: &str) -> Option<&AdapterReport> {
        self.adapters.iter().find(|a| a.adapter == adapter)
    }

    /// All scenario results, adapters in registration order
    pub fn results(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.adapters.iter().flat_map(|a| a.results.iter())
    }

    /// Render in `format`
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if JSON serialization fails.
    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Text => Ok(render_text(self)),
            OutputFormat::Json => render_json(self),
        }
    }
}

/// Plain-text rendering
#[must_use]
pub fn render_text(report: &Report) -> String {
    report.to_string()
}

/// Pretty JSON rendering
///
/// # Errors
///
/// Returns [`serde_json::Error`] if serialization fails.
pub fn render_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Human-readable byte count
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn memory_flags(memory: &MemoryMeasurement) -> String {
    let mut flags = Vec::new();
    if memory.unreliable {
        flags.push("unreliable");
    }
    if memory.clipped {
        flags.push("clipped");
    }
    flags.join(",")
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.settings;
        writeln!(
            f,
            "route table '{}' ({} routes)",
            self.route_spec, self.canonical_routes
        )?;
        writeln!(
            f,
            "warmup {} | iterations {} in {} batches | memory trials {} | settle {} ms | variance threshold {:.0}%",
            s.warmup,
            s.iterations,
            s.samples,
            s.memory_trials,
            s.settle_ms,
            s.variance_threshold * 100.0
        )?;

        writeln!(f)?;
        writeln!(f, "Route table memory")?;
        writeln!(
            f,
            "  {:<10} {:>7} {:>12} {:>9}  flags",
            "adapter", "routes", "bytes", "objects"
        )?;
        for a in &self.adapters {
            let routes = format!("{}/{}", a.effective_routes, a.canonical_routes);
            match &a.memory {
                Some(m) => writeln!(
                    f,
                    "  {:<10} {:>7} {:>12} {:>9}  {}",
                    a.adapter,
                    routes,
                    m.median_bytes,
                    m.median_objects,
                    memory_flags(m)
                )?,
                None => writeln!(
                    f,
                    "  {:<10} {:>7} {:>12} {:>9}  not measured",
                    a.adapter, routes, "-", "-"
                )?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Dispatch")?;
        writeln!(
            f,
            "  {:<10} {:<11} {:>12} {:>10} {:>10}  flags",
            "adapter", "scenario", "ns/op", "B/op", "allocs/op"
        )?;
        for r in self.results() {
            writeln!(
                f,
                "  {:<10} {:<11} {:>12.1} {:>10.1} {:>10.2}  {}",
                r.adapter,
                r.scenario.name(),
                r.ns_per_op,
                r.bytes_per_op,
                r.allocs_per_op,
                if r.unstable { "unstable" } else { "" }
            )?;
        }

        let excluded: Vec<_> = self.adapters.iter().flat_map(|a| a.excluded.iter()).collect();
        if !excluded.is_empty() {
            writeln!(f)?;
            writeln!(f, "Excluded routes")?;
            for e in excluded {
                writeln!(f, "  {e}")?;
            }
        }

        let mismatches: Vec<_> = self
            .adapters
            .iter()
            .flat_map(|a| a.mismatches.iter())
            .collect();
        if !mismatches.is_empty() {
            writeln!(f)?;
            writeln!(f, "Dispatch mismatches")?;
            for m in mismatches {
                writeln!(f, "  {m}")?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings")?;
            for w in &self.warnings {
                writeln!(f, "  {w}")?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped adapters")?;
            for s in &self.skipped {
                writeln!(f, "  {}: {}", s.adapter, s.reason)?;
            }
        }

        writeln!(f)?;
        match self.resident_bytes {
            Some(bytes) => write!(f, "resident memory: {}", format_bytes(bytes))?,
            None => write!(f, "resident memory: unavailable")?,
        }
        if let Some(bytes) = self.allocator_bytes {
            write!(f, " | jemalloc allocated: {}", format_bytes(bytes))?;
        }
        writeln!(f)
    }
}
