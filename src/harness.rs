//! # Harness Module
//!
//! Orchestrates one benchmark run.
//!
//! ## Flow
//!
//! ```text
//! RouteSpec ──► ScenarioSet::from_config (abort on setup error)
//!    │
//!    └─ for each adapter, one at a time:
//!         translate_spec ──► MemoryProbe::measure ──► ScenarioRunner::run_all
//!                                 │                        │
//!                      handlers dropped here      fresh handler per scenario
//! ```
//!
//! Per-adapter failures never abort the batch. An adapter whose build fails is listed
//! under skipped adapters; every other fault class becomes a warning line in the report.

use crate::adapter::{AdapterRegistry, RouterAdapter, SkippedAdapter};
use crate::config::BenchConfig;
use crate::memory::{self, MemoryProbe, MemoryProbeError};
use crate::report::{AdapterReport, Report, RunSettings};
use crate::scenario::{ScenarioError, ScenarioRunner, ScenarioSet};
use crate::spec::RouteSpec;
use crate::translate::translate_spec;
use tracing::{error, info, warn};

/// One configured benchmark run.
pub struct Harness<'a> {
    config: &'a BenchConfig,
    adapters: &'a AdapterRegistry,
    spec: &'a RouteSpec,
}

impl<'a> Harness<'a> {
    /// Harness over `spec` for every adapter in `adapters`
    #[must_use]
    pub fn new(
        config: &'a BenchConfig,
        adapters: &'a AdapterRegistry,
        spec: &'a RouteSpec,
    ) -> Self {
        Self {
            config,
            adapters,
            spec,
        }
    }

    /// Measure every adapter and assemble the report.
    ///
    /// # Errors
    ///
    /// [`ScenarioError`] when the scenario requests do not fit the route table. Nothing
    /// is measured in that case.
    pub fn run(&self) -> Result<Report, ScenarioError> {
        let scenarios = ScenarioSet::from_config(self.spec, &self.config.requests)?;
        let probe = MemoryProbe::from_config(self.config);
        let runner = ScenarioRunner::from_config(self.config);

        let mut report = Report::new(
            self.spec.name(),
            self.spec.len(),
            RunSettings::from(self.config),
        );

        info!(
            route_spec = %self.spec.name(),
            routes_count = self.spec.len(),
            adapters = self.adapters.len(),
            "Benchmark run started"
        );

        if !memory::is_installed() {
            report.warnings.push(
                "counting allocator not installed: memory, B/op and allocs/op are not measured"
                    .to_string(),
            );
        }

        for adapter in self.adapters.iter() {
            match self.run_adapter(adapter, &probe, &runner, &scenarios) {
                Ok(adapter_report) => {
                    collect_warnings(&adapter_report, &mut report.warnings);
                    report.adapters.push(adapter_report);
                }
                Err(skipped) => {
                    error!(adapter = adapter.name(), reason = %skipped.reason, "Adapter skipped");
                    report.skipped.push(skipped);
                }
            }
        }

        report.resident_bytes = memory::resident_bytes();
        report.allocator_bytes = memory::allocator_allocated_bytes();

        info!(
            measured = report.adapters.len(),
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            "Benchmark run finished"
        );
        Ok(report)
    }

    fn run_adapter(
        &self,
        adapter: &dyn RouterAdapter,
        probe: &MemoryProbe,
        runner: &ScenarioRunner,
        scenarios: &ScenarioSet,
    ) -> Result<AdapterReport, SkippedAdapter> {
        let table = translate_spec(self.spec, adapter.name(), adapter.syntax());
        if table.routes.is_empty() {
            return Err(SkippedAdapter {
                adapter: adapter.name().to_string(),
                reason: "no route in the table is expressible in the adapter's syntax".to_string(),
                harness_misuse: false,
            });
        }

        // Every memory-trial handler is dropped before any timing starts
        let (memory, memory_error) = match probe.measure(adapter, &table) {
            Ok(measurement) => (Some(measurement), None),
            Err(MemoryProbeError::Build(err)) => return Err(SkippedAdapter::from(&err)),
            Err(err @ MemoryProbeError::AllocatorNotInstalled) => {
                warn!(adapter = adapter.name(), error = %err, "Memory not measured");
                (None, Some(err.to_string()))
            }
        };

        let outcome = runner
            .run_all(adapter, &table, self.spec, scenarios)
            .map_err(|err| SkippedAdapter::from(&err))?;

        Ok(AdapterReport {
            adapter: adapter.name().to_string(),
            effective_routes: table.effective_count(),
            canonical_routes: table.canonical_count,
            excluded: table.excluded,
            memory,
            memory_error,
            results: outcome.results,
            mismatches: outcome.mismatches,
        })
    }
}

fn collect_warnings(adapter: &AdapterReport, warnings: &mut Vec<String>) {
    let name = &adapter.adapter;
    if !adapter.excluded.is_empty() {
        warnings.push(format!(
            "{name}: {} of {} routes excluded, results cover {} effective routes",
            adapter.excluded.len(),
            adapter.canonical_routes,
            adapter.effective_routes
        ));
    }
    if let Some(memory) = &adapter.memory {
        if memory.unreliable {
            warnings.push(format!(
                "{name}: memory trials spread {} bytes around a median of {} bytes (low confidence)",
                memory.spread_bytes, memory.median_bytes
            ));
        }
        if memory.clipped {
            warnings.push(format!("{name}: negative memory delta clipped to zero"));
        }
    }
    for result in adapter.results.iter().filter(|r| r.unstable) {
        warnings.push(format!(
            "{name} {}: timing batches spread {:.0}% (low confidence)",
            result.scenario,
            result.spread * 100.0
        ));
    }
    if !adapter.mismatches.is_empty() {
        warnings.push(format!(
            "{name}: {} dispatch mismatch(es) in the sanity pass",
            adapter.mismatches.len()
        ));
    }
}
