//! # Benchmark Configuration Module
//!
//! Iteration discipline, memory-trial settings and scenario requests for a run.
//!
//! ## Overview
//!
//! Configuration is layered, later layers winning:
//!
//! 1. Built-in defaults ([`BenchConfig::default`])
//! 2. An optional TOML, YAML or JSON file ([`BenchConfig::load`])
//! 3. Environment variables ([`BenchConfig::apply_env`])
//! 4. Command-line flags (applied by the CLI)
//!
//! [`BenchConfig::validate`] runs once after all layers are applied.
//!
//! ## Environment Variables
//!
//! | variable                   | field                | default |
//! |----------------------------|----------------------|---------|
//! | `BRRTB_WARMUP`             | `warmup`             | 1000    |
//! | `BRRTB_ITERATIONS`         | `iterations`         | 100000  |
//! | `BRRTB_SAMPLES`            | `samples`            | 10      |
//! | `BRRTB_MEMORY_TRIALS`      | `memory_trials`      | 5       |
//! | `BRRTB_SETTLE_MS`          | `settle_ms`          | 20      |
//! | `BRRTB_VARIANCE_THRESHOLD` | `variance_threshold` | 0.10    |
//!
//! ## Example Configuration
//!
//! ```toml
//! iterations = 50000
//! samples = 5
//! adapters = ["radix", "matchit"]
//!
//! [requests]
//! static = "GET /1/users"
//! one_param = "GET /1/classes/go"
//! two_param = "GET /1/classes/go/123456789"
//! ```
//!
//! ```bash
//! BRRTB_ITERATIONS=20000 brrtbench run --config bench.toml
//! ```

use crate::spec::FileFormat;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Overrides [`BenchConfig::warmup`]
pub const ENV_WARMUP: &str = "BRRTB_WARMUP";
/// Overrides [`BenchConfig::iterations`]
pub const ENV_ITERATIONS: &str = "BRRTB_ITERATIONS";
/// Overrides [`BenchConfig::samples`]
pub const ENV_SAMPLES: &str = "BRRTB_SAMPLES";
/// Overrides [`BenchConfig::memory_trials`]
pub const ENV_MEMORY_TRIALS: &str = "BRRTB_MEMORY_TRIALS";
/// Overrides [`BenchConfig::settle_ms`]
pub const ENV_SETTLE_MS: &str = "BRRTB_SETTLE_MS";
/// Overrides [`BenchConfig::variance_threshold`]
pub const ENV_VARIANCE_THRESHOLD: &str = "BRRTB_VARIANCE_THRESHOLD";

/// Configuration error
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The config file could not be read
    Io {
        /// File path
        path: PathBuf,
        /// OS error message
        message: String,
    },
    /// The config file did not deserialize
    Parse {
        /// File path
        path: PathBuf,
        /// Deserializer message
        message: String,
    },
    /// The config file extension is not toml, yaml, yml or json
    UnsupportedFormat {
        /// File path
        path: PathBuf,
    },
    /// An environment variable holds an unparsable value
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
    /// A field value is out of range
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read config {}: {message}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config {}: {message}", path.display())
            }
            ConfigError::UnsupportedFormat { path } => write!(
                f,
                "unsupported config format {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ),
            ConfigError::InvalidEnv { var, value } => {
                write!(f, "invalid value for {var}: '{value}'")
            }
            ConfigError::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Request descriptors for the three single-request scenarios, as `"METHOD /path"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioRequests {
    /// Must resolve to a route without parameters
    #[serde(rename = "static")]
    pub static_route: String,
    /// Must resolve to a route with exactly one parameter
    pub one_param: String,
    /// Must resolve to a route with exactly two parameters
    pub two_param: String,
}

impl Default for ScenarioRequests {
    fn default() -> Self {
        Self {
            static_route: "GET /1/users".to_string(),
            one_param: "GET /1/classes/go".to_string(),
            two_param: "GET /1/classes/go/123456789".to_string(),
        }
    }
}

/// Settings for one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Untimed operations before each timed region
    pub warmup: u64,
    /// Timed operations per (adapter, scenario)
    pub iterations: u64,
    /// Batches the timed operations are split into
    pub samples: u64,
    /// Memory trials per adapter
    pub memory_trials: u32,
    /// Quiescence wait around each memory sample, in milliseconds
    pub settle_ms: u64,
    /// Relative spread above which a measurement is flagged, in `(0, 1]`
    pub variance_threshold: f64,
    /// Adapters to run, by name; empty runs every registered adapter
    pub adapters: Vec<String>,
    /// Route table file; `None` uses the built-in Parse API table
    pub routes: Option<PathBuf>,
    /// Scenario requests
    pub requests: ScenarioRequests,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            warmup: 1_000,
            iterations: 100_000,
            samples: 10,
            memory_trials: 5,
            settle_ms: 20,
            variance_threshold: 0.10,
            adapters: Vec::new(),
            routes: None,
            requests: ScenarioRequests::default(),
        }
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}

impl BenchConfig {
    /// Parse a config from already loaded content
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] when the content does not deserialize.
    pub fn from_str_with_format(
        content: &str,
        format: FileFormat,
        origin: &Path,
    ) -> Result<Self, ConfigError> {
        let parse_err = |message: String| ConfigError::Parse {
            path: origin.to_path_buf(),
            message,
        };
        match format {
            FileFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
            FileFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string())),
            FileFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        }
    }

    /// Load a config file; missing fields take their defaults.
    ///
    /// A relative `routes` path is resolved against the config file's directory.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedFormat`], [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config = Self::from_str_with_format(&content, format, path)?;
        if let (Some(routes), Some(dir)) = (config.routes.as_ref(), path.parent()) {
            if routes.is_relative() {
                config.routes = Some(dir.join(routes));
            }
        }

        info!(path = %path.display(), "Benchmark config loaded");
        Ok(config)
    }

    /// Apply `BRRTB_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] when a set variable does not parse.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    /// Apply `BRRTB_*` overrides from an arbitrary lookup
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] when a present value does not parse.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = parse_env(&lookup, ENV_WARMUP)? {
            self.warmup = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_ITERATIONS)? {
            self.iterations = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_SAMPLES)? {
            self.samples = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_MEMORY_TRIALS)? {
            self.memory_trials = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_SETTLE_MS)? {
            self.settle_ms = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_VARIANCE_THRESHOLD)? {
            self.variance_threshold = v;
        }
        debug!(?self, "Environment overrides applied");
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if self.iterations == 0 {
            return invalid("iterations", "must be at least 1");
        }
        if self.samples == 0 {
            return invalid("samples", "must be at least 1");
        }
        if self.samples > self.iterations {
            return Err(ConfigError::Invalid {
                field: "samples",
                reason: format!(
                    "{} batches cannot split {} iterations",
                    self.samples, self.iterations
                ),
            });
        }
        if self.memory_trials == 0 {
            return invalid("memory_trials", "must be at least 1");
        }
        if !(self.variance_threshold > 0.0 && self.variance_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "variance_threshold",
                reason: format!("{} is outside (0, 1]", self.variance_threshold),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = BenchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.requests.static_route, "GET /1/users");
        assert_eq!(config.memory_trials, 5);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BenchConfig::default();
        config
            .apply_env_from(lookup(&[
                (ENV_ITERATIONS, "500"),
                (ENV_SAMPLES, " 4 "),
                (ENV_VARIANCE_THRESHOLD, "0.25"),
            ]))
            .unwrap();
        assert_eq!(config.iterations, 500);
        assert_eq!(config.samples, 4);
        assert!((config.variance_threshold - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.warmup, 1_000);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = BenchConfig::default();
        let err = config
            .apply_env_from(lookup(&[(ENV_WARMUP, "lots")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                var: ENV_WARMUP,
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases: [(fn(&mut BenchConfig), &str); 5] = [
            (|c| c.iterations = 0, "iterations"),
            (|c| c.samples = 0, "samples"),
            (
                |c| {
                    c.iterations = 3;
                    c.samples = 4;
                },
                "samples",
            ),
            (|c| c.memory_trials = 0, "memory_trials"),
            (|c| c.variance_threshold = 1.5, "variance_threshold"),
        ];
        for (mutate, expected) in cases {
            let mut config = BenchConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = "iterations = 42\n[requests]\none_param = \"GET /1/users/abc\"\n";
        let config =
            BenchConfig::from_str_with_format(toml, FileFormat::Toml, Path::new("b.toml")).unwrap();
        assert_eq!(config.iterations, 42);
        assert_eq!(config.samples, 10);
        assert_eq!(config.requests.one_param, "GET /1/users/abc");
        assert_eq!(config.requests.static_route, "GET /1/users");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = BenchConfig::from_str_with_format(
            "{\"iters\": 3}",
            FileFormat::Json,
            Path::new("b.json"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
