//! # Scenario Module
//!
//! The four fixed benchmark scenarios and the timing protocol that runs them.
//!
//! ## Scenarios
//!
//! | scenario     | requests per operation | source                                     |
//! |--------------|------------------------|--------------------------------------------|
//! | `static`     | 1                      | `requests.static` (0 parameters)           |
//! | `one-param`  | 1                      | `requests.one_param` (1 param)             |
//! | `two-param`  | 1                      | `requests.two_param` (2 params)            |
//! | `full-sweep` | `len(RouteSpec)`       | every route, requested by its pattern text |
//!
//! ## Protocol per (adapter, scenario)
//!
//! 1. Build a fresh handler from the adapter's translated table
//! 2. Sanity pass: dispatch each request once and compare against the reference matcher
//! 3. `warmup` untimed operations
//! 4. `iterations` timed operations in `samples` batches; clock and allocation
//!    counters are read around each batch only
//!
//! Requests are constructed once in [`ScenarioSet::from_config`] and shared by every adapter.

use crate::adapter::{build_handler, AdapterBuildError, Handler, RouterAdapter};
use crate::config::{BenchConfig, ScenarioRequests};
use crate::dispatcher::{synthetic_request, RequestDispatcher};
use crate::memory::AllocSnapshot;
use crate::spec::{ReferenceMatch, RouteSpec};
use crate::translate::TranslatedTable;
use http::{Method, Request, StatusCode};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Benchmark scenario, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scenario {
    /// One static route
    Static,
    /// One route with a single parameter
    OneParam,
    /// One route with two parameters
    TwoParam,
    /// Every route in the table
    FullSweep,
}

impl Scenario {
    /// All scenarios in run order
    pub const ALL: [Scenario; 4] = [
        Scenario::Static,
        Scenario::OneParam,
        Scenario::TwoParam,
        Scenario::FullSweep,
    ];

    /// Report name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Scenario::Static => "static",
            Scenario::OneParam => "one-param",
            Scenario::TwoParam => "two-param",
            Scenario::FullSweep => "full-sweep",
        }
    }

    /// Parameter count the scenario request must resolve to; `None` for the sweep
    #[must_use]
    pub fn expected_params(self) -> Option<usize> {
        match self {
            Scenario::Static => Some(0),
            Scenario::OneParam => Some(1),
            Scenario::TwoParam => Some(2),
            Scenario::FullSweep => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Scenario {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Scenario setup error. Aborts the run: no adapter can be measured fairly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// A descriptor is not `"METHOD /path"`
    InvalidRequest {
        /// Offending descriptor
        descriptor: String,
        /// What is wrong with it
        reason: String,
    },
    /// The request does not resolve against the canonical table
    Unresolved {
        /// Scenario
        scenario: Scenario,
        /// Request descriptor
        request: String,
    },
    /// The request resolves to a route with the wrong parameter count
    WrongParamCount {
        /// Scenario
        scenario: Scenario,
        /// Request descriptor
        request: String,
        /// Route it resolved to
        route: String,
        /// Required parameter count
        expected: usize,
        /// Parameter count of the resolved route
        actual: usize,
    },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::InvalidRequest { descriptor, reason } => {
                write!(f, "invalid request '{descriptor}': {reason}")
            }
            ScenarioError::Unresolved { scenario, request } => write!(
                f,
                "{scenario} request '{request}' matches no route in the table"
            ),
            ScenarioError::WrongParamCount {
                scenario,
                request,
                route,
                expected,
                actual,
            } => write!(
                f,
                "{scenario} request '{request}' resolves to {route} \
                 with {actual} parameter(s), expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ScenarioError {}

/// A parsed `"METHOD /path"` request descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Request path
    pub path: String,
}

impl RequestSpec {
    /// Descriptor for `method` and `path`
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Build the synthetic request
    ///
    /// # Errors
    ///
    /// [`ScenarioError::InvalidRequest`] when the path is not a valid URI.
    pub fn to_request(&self) -> Result<Request<()>, ScenarioError> {
        synthetic_request(&self.method, &self.path).map_err(|e| ScenarioError::InvalidRequest {
            descriptor: self.to_string(),
            reason: e.to_string(),
        })
    }
}

impl FromStr for RequestSpec {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ScenarioError::InvalidRequest {
            descriptor: s.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split_whitespace();
        let (Some(method), Some(path), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid("expected 'METHOD /path'"));
        };
        if !path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| invalid("unknown HTTP method"))?;
        Ok(RequestSpec::new(method, path))
    }
}

impl fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// One scenario's requests, built once and shared by every adapter.
#[derive(Debug)]
pub struct PreparedScenario {
    /// Scenario
    pub scenario: Scenario,
    /// Request descriptors in dispatch order
    pub descriptors: Vec<RequestSpec>,
    requests: Vec<Request<()>>,
}

impl PreparedScenario {
    /// Synthetic requests in dispatch order
    #[must_use]
    pub fn requests(&self) -> &[Request<()>] {
        &self.requests
    }

    /// Dispatches per measured operation
    #[must_use]
    pub fn dispatches_per_op(&self) -> usize {
        self.requests.len()
    }
}

/// The four prepared scenarios in run order.
#[derive(Debug)]
pub struct ScenarioSet {
    scenarios: Vec<PreparedScenario>,
}

impl ScenarioSet {
    /// Validate the configured requests against `spec` and build every request.
    ///
    /// # Errors
    ///
    /// [`ScenarioError`] when a descriptor does not parse or does not resolve to a
    /// route with the scenario's parameter count.
    pub fn from_config(
        spec: &RouteSpec,
        requests: &ScenarioRequests,
    ) -> Result<Self, ScenarioError> {
        let mut scenarios = Vec::with_capacity(Scenario::ALL.len());

        for (scenario, descriptor) in [
            (Scenario::Static, &requests.static_route),
            (Scenario::OneParam, &requests.one_param),
            (Scenario::TwoParam, &requests.two_param),
        ] {
            let request: RequestSpec = descriptor.parse()?;
            let expected = scenario.expected_params().unwrap_or_default();
            let resolved = spec.resolve(&request.method, &request.path).ok_or_else(|| {
                ScenarioError::Unresolved {
                    scenario,
                    request: request.to_string(),
                }
            })?;
            if resolved.params.len() != expected {
                let route = spec
                    .get(resolved.index)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                return Err(ScenarioError::WrongParamCount {
                    scenario,
                    request: request.to_string(),
                    route,
                    expected,
                    actual: resolved.params.len(),
                });
            }
            debug!(
                scenario = %scenario,
                request = %request,
                route_index = resolved.index,
                "Scenario request validated"
            );
            scenarios.push(PreparedScenario {
                scenario,
                requests: vec![request.to_request()?],
                descriptors: vec![request],
            });
        }

        let descriptors: Vec<RequestSpec> = spec
            .routes()
            .iter()
            .zip(spec.sweep_paths())
            .map(|(route, path)| RequestSpec::new(route.method.clone(), path))
            .collect();
        let requests = descriptors
            .iter()
            .map(RequestSpec::to_request)
            .collect::<Result<Vec<_>, _>>()?;
        scenarios.push(PreparedScenario {
            scenario: Scenario::FullSweep,
            descriptors,
            requests,
        });

        Ok(Self { scenarios })
    }

    /// Prepared scenarios in run order
    pub fn iter(&self) -> impl Iterator<Item = &PreparedScenario> {
        self.scenarios.iter()
    }

    /// Prepared scenario by kind
    #[must_use]
    pub fn get(&self, scenario: Scenario) -> Option<&PreparedScenario> {
        self.scenarios.iter().find(|p| p.scenario == scenario)
    }
}

/// A sanity-pass dispatch that disagreed with the reference matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchMismatch {
    /// Adapter name
    pub adapter: String,
    /// Scenario
    pub scenario: Scenario,
    /// Request descriptor
    pub request: String,
    /// What the reference matcher expected
    pub expected: String,
    /// What the adapter did
    pub actual: String,
}

impl fmt::Display for DispatchMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} expected {}, got {}",
            self.adapter, self.scenario, self.request, self.expected, self.actual
        )
    }
}

/// Timing and allocation statistics for one (adapter, scenario).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// Adapter name
    pub adapter: String,
    /// Scenario
    pub scenario: Scenario,
    /// Timed operations; always the configured count
    pub iterations: u64,
    /// Batches the timed operations were split into
    pub samples: u64,
    /// Dispatches per operation
    pub dispatches_per_op: u64,
    /// Mean nanoseconds per operation
    pub ns_per_op: f64,
    /// Mean bytes allocated per operation
    pub bytes_per_op: f64,
    /// Mean allocation events per operation
    pub allocs_per_op: f64,
    /// `(max - min) / median` of per-batch ns/op
    pub spread: f64,
    /// Spread exceeded the variance threshold
    pub unstable: bool,
}

/// Results and mismatches of every scenario for one adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    /// Results in scenario order
    pub results: Vec<ScenarioResult>,
    /// Sanity-pass disagreements
    pub mismatches: Vec<DispatchMismatch>,
}

/// Split `iterations` into `samples` batch sizes summing to `iterations`.
#[must_use]
pub fn batch_sizes(iterations: u64, samples: u64) -> Vec<u64> {
    let samples = samples.clamp(1, iterations.max(1));
    let base = iterations / samples;
    let extra = iterations % samples;
    (0..samples)
        .map(|i| base + u64::from(i < extra))
        .filter(|&size| size > 0)
        .collect()
}

/// `(max - min) / median`; zero when the median is zero.
#[must_use]
pub fn relative_spread(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    if median <= 0.0 {
        return 0.0;
    }
    (sorted[n - 1] - sorted[0]) / median
}

fn describe_expected(spec: &RouteSpec, expected: Option<&ReferenceMatch>) -> String {
    match expected {
        None => StatusCode::NOT_FOUND.to_string(),
        Some(m) => {
            let route = spec.get(m.index).map(ToString::to_string).unwrap_or_default();
            let params: Vec<String> = m.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{route} [{}]", params.join(", "))
        }
    }
}

/// Drives the scenarios with warmup and iteration discipline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioRunner {
    warmup: u64,
    iterations: u64,
    samples: u64,
    variance_threshold: f64,
}

impl ScenarioRunner {
    /// Runner with explicit settings
    #[must_use]
    pub fn new(warmup: u64, iterations: u64, samples: u64, variance_threshold: f64) -> Self {
        Self {
            warmup,
            iterations: iterations.max(1),
            samples: samples.max(1),
            variance_threshold,
        }
    }

    /// Runner configured from [`BenchConfig`]
    #[must_use]
    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(
            config.warmup,
            config.iterations,
            config.samples,
            config.variance_threshold,
        )
    }

    /// Run every scenario for one adapter, in order.
    ///
    /// # Errors
    ///
    /// [`AdapterBuildError`] if the adapter cannot build its table; nothing is
    /// measured for it then.
    pub fn run_all(
        &self,
        adapter: &dyn RouterAdapter,
        table: &TranslatedTable,
        spec: &RouteSpec,
        set: &ScenarioSet,
    ) -> Result<ScenarioOutcome, AdapterBuildError> {
        let mut outcome = ScenarioOutcome::default();
        for prepared in set.iter() {
            let (result, mismatches) = self.run_scenario(adapter, table, spec, prepared)?;
            outcome.results.push(result);
            outcome.mismatches.extend(mismatches);
        }
        Ok(outcome)
    }

    /// Run one scenario for one adapter against a freshly built handler.
    ///
    /// # Errors
    ///
    /// [`AdapterBuildError`] if the adapter cannot build its table.
    pub fn run_scenario(
        &self,
        adapter: &dyn RouterAdapter,
        table: &TranslatedTable,
        spec: &RouteSpec,
        prepared: &PreparedScenario,
    ) -> Result<(ScenarioResult, Vec<DispatchMismatch>), AdapterBuildError> {
        let handler = build_handler(adapter, table)?;
        let mismatches = sanity_pass(adapter.name(), handler.as_ref(), table, spec, prepared);
        let result = self.measure(adapter.name(), handler.as_ref(), prepared);
        Ok((result, mismatches))
    }

    fn measure(
        &self,
        adapter: &str,
        handler: &dyn Handler,
        prepared: &PreparedScenario,
    ) -> ScenarioResult {
        let requests = prepared.requests();
        let mut dispatcher = RequestDispatcher::new(handler);

        for _ in 0..self.warmup {
            dispatcher.run_operation(requests);
        }
        dispatcher.reset();

        let batches = batch_sizes(self.iterations, self.samples);
        let mut batch_ns_per_op = Vec::with_capacity(batches.len());
        let mut total_ns: u128 = 0;
        let mut total_bytes: u64 = 0;
        let mut total_allocs: u64 = 0;

        for &size in &batches {
            let before = AllocSnapshot::current();
            let start = Instant::now();
            for _ in 0..size {
                dispatcher.run_operation(requests);
            }
            let elapsed = start.elapsed();
            let after = AllocSnapshot::current();

            total_ns += elapsed.as_nanos();
            total_bytes += after.bytes_since(&before);
            total_allocs += after.allocs_since(&before);
            batch_ns_per_op.push(elapsed.as_nanos() as f64 / size as f64);
        }

        let iterations = self.iterations;
        let spread = relative_spread(&batch_ns_per_op);
        let result = ScenarioResult {
            adapter: adapter.to_string(),
            scenario: prepared.scenario,
            iterations,
            samples: batches.len() as u64,
            dispatches_per_op: dispatcher.dispatches() / iterations,
            ns_per_op: total_ns as f64 / iterations as f64,
            bytes_per_op: total_bytes as f64 / iterations as f64,
            allocs_per_op: total_allocs as f64 / iterations as f64,
            spread,
            unstable: spread > self.variance_threshold,
        };

        info!(
            adapter = adapter,
            scenario = %result.scenario,
            iterations = result.iterations,
            ns_per_op = result.ns_per_op,
            bytes_per_op = result.bytes_per_op,
            allocs_per_op = result.allocs_per_op,
            "Scenario measured"
        );
        if result.unstable {
            warn!(
                adapter = adapter,
                scenario = %result.scenario,
                spread = result.spread,
                threshold = self.variance_threshold,
                "Timing batches exceed variance threshold"
            );
        }
        result
    }
}

/// Dispatch each request once and compare with the reference matcher restricted to
/// the routes `table` actually registered.
#[must_use]
pub fn sanity_pass(
    adapter: &str,
    handler: &dyn Handler,
    table: &TranslatedTable,
    spec: &RouteSpec,
    prepared: &PreparedScenario,
) -> Vec<DispatchMismatch> {
    let mut dispatcher = RequestDispatcher::new(handler);
    let mut mismatches = Vec::new();

    for (descriptor, request) in prepared.descriptors.iter().zip(prepared.requests()) {
        let expected = spec.resolve_where(&descriptor.method, &descriptor.path, |i| {
            table.is_effective(i)
        });
        let status = dispatcher.dispatch(request);
        let resolved = handler.resolve(&descriptor.method, &descriptor.path);

        let actual = match (&resolved, status.is_success()) {
            (Some(m), true) => {
                let params: Vec<String> = m
                    .params
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                let route = spec.get(m.route).map(ToString::to_string).unwrap_or_default();
                format!("{route} [{}]", params.join(", "))
            }
            _ => status.to_string(),
        };
        let agrees = match (&expected, &resolved) {
            (None, None) => !status.is_success(),
            (Some(want), Some(got)) => {
                status.is_success()
                    && want.index == got.route
                    && want.params.len() == got.params.len()
                    && want
                        .params
                        .iter()
                        .zip(got.params.iter())
                        .all(|((wk, wv), (gk, gv))| wk.as_str() == gk.as_ref() && wv == gv)
            }
            _ => false,
        };

        if !agrees {
            let mismatch = DispatchMismatch {
                adapter: adapter.to_string(),
                scenario: prepared.scenario,
                request: descriptor.to_string(),
                expected: describe_expected(spec, expected.as_ref()),
                actual,
            };
            warn!(
                adapter = adapter,
                scenario = %mismatch.scenario,
                request = %mismatch.request,
                expected = %mismatch.expected,
                actual = %mismatch.actual,
                "Dispatch mismatch"
            );
            mismatches.push(mismatch);
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_order_and_names() {
        let names: Vec<_> = Scenario::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["static", "one-param", "two-param", "full-sweep"]);
        assert_eq!(Scenario::TwoParam.expected_params(), Some(2));
        assert_eq!(Scenario::FullSweep.expected_params(), None);
    }

    #[test]
    fn test_request_spec_parse() {
        let req: RequestSpec = "get /1/users".parse().unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/1/users");
        assert_eq!(req.to_string(), "GET /1/users");

        assert!("/1/users".parse::<RequestSpec>().is_err());
        assert!("GET 1/users".parse::<RequestSpec>().is_err());
        assert!("GET /a /b".parse::<RequestSpec>().is_err());
    }

    #[test]
    fn test_batch_sizes_sum_to_iterations() {
        assert_eq!(batch_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(batch_sizes(5, 5), vec![1, 1, 1, 1, 1]);
        assert_eq!(batch_sizes(3, 10), vec![1, 1, 1]);
        for (iterations, samples) in [(1, 1), (99_999, 7), (100_000, 10)] {
            assert_eq!(batch_sizes(iterations, samples).iter().sum::<u64>(), iterations);
        }
    }

    #[test]
    fn test_relative_spread() {
        assert_eq!(relative_spread(&[]), 0.0);
        assert_eq!(relative_spread(&[10.0, 10.0, 10.0]), 0.0);
        let spread = relative_spread(&[9.0, 10.0, 12.0]);
        assert!((spread - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_set_from_defaults() {
        let spec = crate::spec::parse_api();
        let set = ScenarioSet::from_config(&spec, &ScenarioRequests::default()).unwrap();
        assert_eq!(set.iter().count(), 4);
        assert_eq!(set.get(Scenario::Static).unwrap().dispatches_per_op(), 1);
        assert_eq!(
            set.get(Scenario::FullSweep).unwrap().dispatches_per_op(),
            spec.len()
        );
        assert_eq!(
            set.get(Scenario::FullSweep).unwrap().descriptors[0].path,
            "/1/classes/:className"
        );
    }

    #[test]
    fn test_scenario_set_rejects_wrong_param_count() {
        let spec = crate::spec::parse_api();
        let requests = ScenarioRequests {
            one_param: "GET /1/users".to_string(),
            ..ScenarioRequests::default()
        };
        let err = ScenarioSet::from_config(&spec, &requests).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::WrongParamCount {
                scenario: Scenario::OneParam,
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_scenario_set_rejects_unresolved() {
        let spec = crate::spec::parse_api();
        let requests = ScenarioRequests {
            static_route: "GET /nowhere".to_string(),
            ..ScenarioRequests::default()
        };
        assert!(matches!(
            ScenarioSet::from_config(&spec, &requests),
            Err(ScenarioError::Unresolved {
                scenario: Scenario::Static,
                ..
            })
        ));
    }
}
