use crate::adapter::{AdapterRegistry, HandlerRegistry};
use crate::config::BenchConfig;
use crate::harness::Harness;
use crate::logging::LogConfig;
use crate::report::OutputFormat;
use crate::scenario::{sanity_pass, ScenarioSet};
use crate::spec::{load_route_spec, parse_api, RouteSpec};
use crate::translate::{translate_spec, ParamStyle, Syntax, UnsupportedPatternError};
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for brrtbench
///
/// Benchmarks HTTP path routers on route-table memory and per-request dispatch cost.
#[derive(Parser, Debug)]
#[command(name = "brrtbench", version)]
#[command(about = "HTTP path-router benchmark harness", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging configuration: `BRRTB_LOG_*` variables, raised by `-v` flags
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        let level = match self.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        };
        if let Some(level) = level {
            config.log_level = level.to_string();
        }
        config
    }
}

/// Where the routes and settings come from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Benchmark config file (TOML, YAML or JSON)
    #[arg(short, long, env = "BRRTB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Route table file; the built-in Parse API table when omitted
    #[arg(short, long, env = "BRRTB_ROUTES")]
    pub routes: Option<PathBuf>,

    /// Adapters to include (repeatable or comma-separated); all when omitted
    #[arg(short, long = "adapter", value_delimiter = ',')]
    pub adapters: Vec<String>,
}

/// Timing and memory overrides
#[derive(Args, Debug, Clone, Default)]
pub struct BenchArgs {
    /// Untimed operations before each timed region
    #[arg(long)]
    pub warmup: Option<u64>,

    /// Timed operations per adapter and scenario
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Batches the timed operations are split into
    #[arg(long)]
    pub samples: Option<u64>,

    /// Memory trials per adapter
    #[arg(long)]
    pub memory_trials: Option<u32>,

    /// Allocator settle interval in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Relative spread that flags a measurement, in (0, 1]
    #[arg(long)]
    pub variance_threshold: Option<f64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full benchmark and print the report
    Run {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        bench: BenchArgs,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print every adapter's translated route table and exclusions
    Routes {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Dispatch the scenario requests once per adapter and compare with the reference matcher
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List registered adapters
    Adapters,
}

/// Layer defaults, config file, environment and flags into a validated config.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded, an environment override
/// does not parse, or the final values are out of range.
pub fn build_config(source: &SourceArgs, bench: Option<&BenchArgs>) -> Result<BenchConfig> {
    let mut config = match &source.config {
        Some(path) => BenchConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BenchConfig::default(),
    };
    config.apply_env()?;

    if let Some(routes) = &source.routes {
        config.routes = Some(routes.clone());
    }
    if !source.adapters.is_empty() {
        config.adapters.clone_from(&source.adapters);
    }
    if let Some(bench) = bench {
        if let Some(v) = bench.warmup {
            config.warmup = v;
        }
        if let Some(v) = bench.iterations {
            config.iterations = v;
        }
        if let Some(v) = bench.samples {
            config.samples = v;
        }
        if let Some(v) = bench.memory_trials {
            config.memory_trials = v;
        }
        if let Some(v) = bench.settle_ms {
            config.settle_ms = v;
        }
        if let Some(v) = bench.variance_threshold {
            config.variance_threshold = v;
        }
    }

    config.validate()?;
    Ok(config)
}

/// The configured route table, or the built-in Parse API table
///
/// # Errors
///
/// Returns an error if the route file cannot be loaded.
pub fn load_routes(config: &BenchConfig) -> Result<RouteSpec> {
    match &config.routes {
        Some(path) => load_route_spec(path)
            .with_context(|| format!("Failed to load routes {}", path.display())),
        None => Ok(parse_api()),
    }
}

fn registry_for(config: &BenchConfig) -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::with_defaults();
    registry.select(&config.adapters)?;
    Ok(registry)
}

fn describe_syntax(syntax: Syntax) -> String {
    let (param, catch_all) = match syntax.style {
        ParamStyle::Colon => (":name", "*name"),
        ParamStyle::Brace => ("{name}", "{*name}"),
    };
    if syntax.catch_all {
        format!("{param}, {catch_all}")
    } else {
        format!("{param}, no catch-all")
    }
}

#[derive(Serialize)]
struct ListedRoute {
    index: usize,
    method: String,
    pattern: String,
    params: Vec<String>,
}

#[derive(Serialize)]
struct RouteListing {
    adapter: &'static str,
    syntax: Syntax,
    effective_routes: usize,
    canonical_routes: usize,
    routes: Vec<ListedRoute>,
    excluded: Vec<UnsupportedPatternError>,
}

/// Execute a parsed command, writing its output to `out`
///
/// # Errors
///
/// Returns an error if:
/// - The config or route file cannot be loaded, or the config is invalid
/// - An `--adapter` name is not registered
/// - The scenario requests do not fit the route table
/// - `check` finds mismatches or skipped adapters
/// - Writing to `out` fails
pub fn run_cli(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Run {
            source,
            bench,
            format,
        } => {
            let config = build_config(&source, Some(&bench))?;
            let spec = load_routes(&config)?;
            let registry = registry_for(&config)?;

            let report = Harness::new(&config, &registry, &spec).run()?;
            let rendered = report.render(format).context("Failed to render report")?;
            write!(out, "{rendered}")?;
            if format == OutputFormat::Json {
                writeln!(out)?;
            }
            Ok(())
        }
        Commands::Routes { source, format } => {
            let config = build_config(&source, None)?;
            let spec = load_routes(&config)?;
            let registry = registry_for(&config)?;

            let listings: Vec<RouteListing> = registry
                .iter()
                .map(|adapter| {
                    let table = translate_spec(&spec, adapter.name(), adapter.syntax());
                    RouteListing {
                        adapter: adapter.name(),
                        syntax: adapter.syntax(),
                        effective_routes: table.effective_count(),
                        canonical_routes: table.canonical_count,
                        routes: table
                            .routes
                            .iter()
                            .map(|r| ListedRoute {
                                index: r.index,
                                method: r.method.to_string(),
                                pattern: r.pattern.clone(),
                                params: r.param_names.clone(),
                            })
                            .collect(),
                        excluded: table.excluded,
                    }
                })
                .collect();

            match format {
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&listings)?)?;
                }
                OutputFormat::Text => {
                    for listing in &listings {
                        writeln!(
                            out,
                            "{} ({}): {}/{} routes",
                            listing.adapter,
                            describe_syntax(listing.syntax),
                            listing.effective_routes,
                            listing.canonical_routes
                        )?;
                        for route in &listing.routes {
                            writeln!(
                                out,
                                "  [{:>2}] {:<7} {}",
                                route.index, route.method, route.pattern
                            )?;
                        }
                        for excluded in &listing.excluded {
                            writeln!(
                                out,
                                "  excluded: {} {} ({})",
                                excluded.method, excluded.pattern, excluded.feature
                            )?;
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Check { source } => {
            let config = build_config(&source, None)?;
            let spec = load_routes(&config)?;
            let registry = registry_for(&config)?;
            let scenarios = ScenarioSet::from_config(&spec, &config.requests)?;

            let (handlers, skipped) = HandlerRegistry::initialize(&registry, &spec);
            let mut total = 0usize;
            for (name, handler) in handlers.iter() {
                let Some(adapter) = registry.get(name) else {
                    continue;
                };
                let table = translate_spec(&spec, name, adapter.syntax());
                let mut found = 0usize;
                for prepared in scenarios.iter() {
                    for mismatch in sanity_pass(name, handler, &table, &spec, prepared) {
                        writeln!(out, "  mismatch: {mismatch}")?;
                        found += 1;
                    }
                }
                writeln!(
                    out,
                    "{name}: {}/{} routes, {}",
                    table.effective_count(),
                    table.canonical_count,
                    if found == 0 {
                        "ok".to_string()
                    } else {
                        format!("{found} mismatch(es)")
                    }
                )?;
                total += found;
            }
            for s in &skipped {
                writeln!(out, "{}: skipped: {}", s.adapter, s.reason)?;
            }

            info!(
                handlers = handlers.len(),
                mismatches = total,
                skipped = skipped.len(),
                "Check finished"
            );
            if total > 0 || !skipped.is_empty() {
                bail!(
                    "check failed: {total} mismatch(es), {} skipped adapter(s)",
                    skipped.len()
                );
            }
            Ok(())
        }
        Commands::Adapters => {
            let registry = AdapterRegistry::with_defaults();
            for adapter in registry.iter() {
                writeln!(
                    out,
                    "{:<10} {}",
                    adapter.name(),
                    describe_syntax(adapter.syntax())
                )?;
            }
            Ok(())
        }
    }
}
