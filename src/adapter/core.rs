use crate::dispatcher::StatusSink;
use crate::router::ParamVec;
use crate::translate::{Syntax, TranslatedRoute, TranslatedTable};
use http::{Method, Request, StatusCode};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error};

/// A successful dispatch: the canonical route index and the extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Index of the matched route in the canonical [`RouteSpec`](crate::spec::RouteSpec)
    pub route: usize,
    /// Path parameters in pattern order
    pub params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name (last write wins)
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A built route table bound to one engine instance.
pub trait Handler {
    /// Look up the route for `method` and `path`.
    fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch>;

    /// Dispatch one request, recording only the status code in `sink`.
    fn dispatch(&self, request: &Request<()>, sink: &mut StatusSink) {
        let status = match self.resolve(request.method(), request.uri().path()) {
            Some(matched) => {
                std::hint::black_box(&matched);
                StatusCode::OK
            }
            None => StatusCode::NOT_FOUND,
        };
        sink.record(status);
    }
}

/// Per-engine capability set: native syntax plus a fresh table build.
///
/// Adapters hold no state across builds, so `build` can be repeated for memory trials.
pub trait RouterAdapter {
    /// Stable identifier used in every report line for this engine
    fn name(&self) -> &'static str;

    /// Native pattern syntax of the engine
    fn syntax(&self) -> Syntax;

    /// Register every route into a fresh engine instance.
    ///
    /// # Errors
    ///
    /// [`AdapterBuildError`] when the engine rejects a route.
    fn build(&self, routes: &[TranslatedRoute]) -> Result<Box<dyn Handler>, AdapterBuildError>;
}

/// Failure to construct an adapter's route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterBuildError {
    /// The same `(method, translated pattern)` was handed to the adapter twice.
    /// This is a harness setup error, not an engine limitation.
    DuplicateRoute {
        /// Adapter name
        adapter: String,
        /// HTTP method
        method: String,
        /// Translated pattern
        pattern: String,
    },
    /// The table was translated for a different adapter
    TableMismatch {
        /// Adapter asked to build
        adapter: String,
        /// Adapter the table was translated for
        table_adapter: String,
    },
    /// The engine refused a route the harness considers valid
    Engine {
        /// Adapter name
        adapter: String,
        /// HTTP method
        method: String,
        /// Translated pattern
        pattern: String,
        /// Engine error message
        reason: String,
    },
}

impl AdapterBuildError {
    /// Whether the failure is harness misuse rather than an engine incompatibility
    #[must_use]
    pub fn is_harness_misuse(&self) -> bool {
        !matches!(self, AdapterBuildError::Engine { .. })
    }

    /// Adapter the error belongs to
    #[must_use]
    pub fn adapter(&self) -> &str {
        match self {
            AdapterBuildError::DuplicateRoute { adapter, .. }
            | AdapterBuildError::TableMismatch { adapter, .. }
            | AdapterBuildError::Engine { adapter, .. } => adapter,
        }
    }
}

impl fmt::Display for AdapterBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterBuildError::DuplicateRoute {
                adapter,
                method,
                pattern,
            } => write!(
                f,
                "harness misuse: {adapter} was given route {method} {pattern} more than once"
            ),
            AdapterBuildError::TableMismatch {
                adapter,
                table_adapter,
            } => write!(
                f,
                "harness misuse: {adapter} was given a table translated for {table_adapter}"
            ),
            AdapterBuildError::Engine {
                adapter,
                method,
                pattern,
                reason,
            } => write!(
                f,
                "engine incompatibility: {adapter} rejected route {method} {pattern}: {reason}"
            ),
        }
    }
}

impl std::error::Error for AdapterBuildError {}

/// An adapter left out of the measurements, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAdapter {
    /// Adapter name
    pub adapter: String,
    /// Human-readable reason
    pub reason: String,
    /// Whether the harness, not the engine, was at fault
    pub harness_misuse: bool,
}

impl From<&AdapterBuildError> for SkippedAdapter {
    fn from(err: &AdapterBuildError) -> Self {
        Self {
            adapter: err.adapter().to_string(),
            reason: err.to_string(),
            harness_misuse: err.is_harness_misuse(),
        }
    }
}

/// Check `table` for harness misuse, then build it with `adapter`.
///
/// This is the entry point the harness uses for every build so duplicate
/// registrations are reported as misuse before any engine sees them.
///
/// # Errors
///
/// [`AdapterBuildError::TableMismatch`], [`AdapterBuildError::DuplicateRoute`] or
/// whatever the adapter's own `build` returns.
pub fn build_handler(
    adapter: &dyn RouterAdapter,
    table: &TranslatedTable,
) -> Result<Box<dyn Handler>, AdapterBuildError> {
    if table.adapter != adapter.name() {
        return Err(AdapterBuildError::TableMismatch {
            adapter: adapter.name().to_string(),
            table_adapter: table.adapter.clone(),
        });
    }

    let mut seen = HashSet::with_capacity(table.routes.len());
    for route in &table.routes {
        if !seen.insert((&route.method, route.pattern.as_str())) {
            let err = AdapterBuildError::DuplicateRoute {
                adapter: adapter.name().to_string(),
                method: route.method.to_string(),
                pattern: route.pattern.clone(),
            };
            error!(adapter = adapter.name(), error = %err, "Adapter build aborted");
            return Err(err);
        }
    }

    let handler = adapter.build(&table.routes)?;
    debug!(
        adapter = adapter.name(),
        routes_count = table.routes.len(),
        "Adapter route table built"
    );
    Ok(handler)
}
