//! # CLI Module
//!
//! Command-line interface of the `brrtbench` binary.
//!
//! ## Commands
//!
//! ### `run`
//!
//! Full benchmark: memory probe plus the four dispatch scenarios for every adapter.
//!
//! ```bash
//! brrtbench run --iterations 50000 --samples 5 --format json > report.json
//! ```
//!
//! Options:
//! - `--config <FILE>` - TOML, YAML or JSON benchmark config (`BRRTB_CONFIG`)
//! - `--routes <FILE>` - Route table file; the built-in Parse API table otherwise (`BRRTB_ROUTES`)
//! - `--adapter <NAME>` - Restrict to the named adapters (repeatable or comma-separated)
//! - `--warmup`, `--iterations`, `--samples` - Timing discipline
//! - `--memory-trials`, `--settle-ms`, `--variance-threshold` - Memory protocol
//! - `--format <text|json>` - Report format (default: text)
//!
//! ### `routes`
//!
//! Print each adapter's translated table and the routes it excludes:
//!
//! ```bash
//! brrtbench routes --adapter radix
//! ```
//!
//! ### `check`
//!
//! Build every handler once and run the sanity pass for the scenario requests.
//! Exits non-zero on any mismatch or skipped adapter.
//!
//! ### `adapters`
//!
//! List the registered adapters and their native syntax.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use brrtbench::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli, &mut std::io::stdout().lock())?;
//! ```
//!
//! ## Configuration precedence
//!
//! Defaults, then `--config`, then `BRRTB_*` environment variables, then flags.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{build_config, load_routes, run_cli, BenchArgs, Cli, Commands, SourceArgs};
