//! # brrtbench
//!
//! **brrtbench** compares HTTP path routers under identical, reproducible conditions: the
//! memory cost of building each router's route table, and the latency and allocation cost
//! of dispatching requests against it.
//!
//! ## Overview
//!
//! Naive router benchmarks mislead in predictable ways: request construction inside the
//! timed loop, warmup effects, allocator noise, and route tables that silently differ
//! because one engine cannot express a pattern. The harness controls each of these:
//!
//! - one canonical route table, translated into every engine's native syntax, with
//!   exclusions counted and reported
//! - requests built once, outside any timed region, with the same constructor for every engine
//! - a status-only response sink, so no body is ever produced
//! - per-thread allocation counters read around timed batches and memory trials only
//! - medians over repeated trials, with spread flagged rather than averaged away
//!
//! ## Architecture
//!
//! - **[`spec`]** - Canonical route tables and the reference matcher
//! - **[`translate`]** - Canonical to native pattern translation
//! - **[`router`]** - In-tree routing engines (segment radix tree, linear regex table)
//! - **[`adapter`]** - The engine capability contract and the built-in adapters
//! - **[`memory`]** - Counting allocator and the route-table memory probe
//! - **[`dispatcher`]** - Synthetic request dispatch into a status sink
//! - **[`scenario`]** - The four scenarios and the timing protocol
//! - **[`report`]** - Text and JSON reports
//! - **[`harness`]** - Orchestration of a whole run
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - Settings, tracing setup and the binary's commands
//!
//! ### Run Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as brrtbench run
//!     participant Harness
//!     participant Translator as translate_spec
//!     participant Probe as MemoryProbe
//!     participant Runner as ScenarioRunner
//!     participant Report
//!
//!     CLI->>Harness: run(config, adapters, spec)
//!     Harness->>Harness: ScenarioSet::from_config (validate requests)
//!     loop every adapter, one at a time
//!         Harness->>Translator: translate for adapter syntax
//!         Translator-->>Harness: TranslatedTable (+ exclusions)
//!         Harness->>Probe: measure (N trials, median)
//!         Probe-->>Harness: MemoryMeasurement
//!         loop static, one-param, two-param, full-sweep
//!             Harness->>Runner: fresh handler, sanity pass, warmup, timed batches
//!             Runner-->>Harness: ScenarioResult
//!         end
//!     end
//!     Harness->>Report: render text / json
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brrtbench::adapter::AdapterRegistry;
//! use brrtbench::config::BenchConfig;
//! use brrtbench::harness::Harness;
//! use brrtbench::spec::parse_api;
//!
//! let config = BenchConfig::default();
//! let adapters = AdapterRegistry::with_defaults();
//! let spec = parse_api();
//! let report = Harness::new(&config, &adapters, &spec).run()?;
//! println!("{report}");
//! ```
//!
//! Memory figures need the counting allocator installed as the global allocator; the
//! `brrtbench` binary does this. Without it the memory section reads "not measured" and
//! B/op and allocs/op stay at zero.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod harness;
pub mod logging;
pub mod memory;
pub mod report;
pub mod router;
pub mod scenario;
pub mod spec;
pub mod translate;

pub use adapter::{AdapterRegistry, Handler, RouterAdapter};
pub use config::BenchConfig;
pub use harness::Harness;
pub use report::Report;
pub use spec::{parse_api, Route, RouteSpec};
