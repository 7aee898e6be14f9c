//! # Pattern Translation
//!
//! Rewrites canonical routes (`/users/:id`, `/static/*path`) into the native pattern
//! syntax of each routing engine. Translation is a structure-preserving rename of the
//! parameter delimiter: method, literal text, parameter names and positions are kept
//! exactly.
//!
//! Routes that an engine cannot express are excluded from that engine's table and
//! recorded as [`UnsupportedPatternError`]s, never substituted, so that the effective
//! route count of every adapter can be audited against the canonical count.

use crate::spec::{PatternError, Route, RouteSpec, Segment};
use http::Method;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Parameter delimiter convention of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamStyle {
    /// `:name` and `*name`
    Colon,
    /// `{name}` and `{*name}`
    Brace,
}

/// Native syntax descriptor of a routing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Syntax {
    /// Parameter delimiter convention
    pub style: ParamStyle,
    /// Whether a trailing catch-all can be expressed
    pub catch_all: bool,
}

impl Syntax {
    /// `:name` parameters with `*name` catch-all
    pub const COLON: Syntax = Syntax {
        style: ParamStyle::Colon,
        catch_all: true,
    };

    /// `{name}` parameters with `{*name}` catch-all
    pub const BRACE: Syntax = Syntax {
        style: ParamStyle::Brace,
        catch_all: true,
    };

    /// Same delimiters, without catch-all support
    #[must_use]
    pub const fn without_catch_all(self) -> Syntax {
        Syntax {
            style: self.style,
            catch_all: false,
        }
    }
}

/// A route rewritten into one engine's syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedRoute {
    /// Position of the canonical route in its [`RouteSpec`]
    pub index: usize,
    /// HTTP method
    pub method: Method,
    /// Native pattern
    pub pattern: String,
    /// Ordered parameter names
    pub param_names: Vec<String>,
}

/// A canonical route the target syntax cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedPatternError {
    /// Adapter whose syntax rejected the route
    pub adapter: String,
    /// HTTP method of the route
    pub method: String,
    /// Canonical pattern of the route
    pub pattern: String,
    /// The feature the syntax lacks
    pub feature: &'static str,
}

impl fmt::Display for UnsupportedPatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: route {} {} uses a {} which this router cannot express",
            self.adapter, self.method, self.pattern, self.feature
        )
    }
}

impl std::error::Error for UnsupportedPatternError {}

fn push_segment(out: &mut String, segment: &Segment, style: ParamStyle) {
    out.push('/');
    match (segment, style) {
        (Segment::Static(text), _) => out.push_str(text),
        (Segment::Param(name), ParamStyle::Colon) => {
            out.push(':');
            out.push_str(name);
        }
        (Segment::CatchAll(name), ParamStyle::Colon) => {
            out.push('*');
            out.push_str(name);
        }
        (Segment::Param(name), ParamStyle::Brace) => {
            out.push('{');
            out.push_str(name);
            out.push('}');
        }
        (Segment::CatchAll(name), ParamStyle::Brace) => {
            out.push_str("{*");
            out.push_str(name);
            out.push('}');
        }
    }
}

/// Translate one canonical route into `syntax`.
///
/// # Errors
///
/// [`UnsupportedPatternError`] when the route has a trailing catch-all and the
/// syntax has no catch-all support.
pub fn translate(
    route: &Route,
    index: usize,
    adapter: &str,
    syntax: Syntax,
) -> Result<TranslatedRoute, UnsupportedPatternError> {
    if route.has_catch_all() && !syntax.catch_all {
        return Err(UnsupportedPatternError {
            adapter: adapter.to_string(),
            method: route.method.to_string(),
            pattern: route.pattern.clone(),
            feature: "trailing catch-all",
        });
    }

    let segments = route.segments();
    let pattern = if segments.is_empty() {
        "/".to_string()
    } else {
        let mut out = String::with_capacity(route.pattern.len() + segments.len());
        for segment in segments {
            push_segment(&mut out, segment, syntax.style);
        }
        out
    };

    Ok(TranslatedRoute {
        index,
        method: route.method.clone(),
        pattern,
        param_names: route.param_names().map(str::to_string).collect(),
    })
}

/// One adapter's view of a [`RouteSpec`]: the translated routes it will register
/// plus the routes excluded because its syntax cannot express them.
#[derive(Debug, Clone)]
pub struct TranslatedTable {
    /// Adapter the table was translated for
    pub adapter: String,
    /// Number of routes in the canonical table
    pub canonical_count: usize,
    /// Effective routes in canonical order
    pub routes: Vec<TranslatedRoute>,
    /// Routes excluded from this adapter's table
    pub excluded: Vec<UnsupportedPatternError>,
    included: Vec<bool>,
}

impl TranslatedTable {
    /// Number of routes the adapter will register
    #[must_use]
    pub fn effective_count(&self) -> usize {
        self.routes.len()
    }

    /// Whether the canonical route at `index` made it into this table
    #[must_use]
    pub fn is_effective(&self, index: usize) -> bool {
        self.included.get(index).copied().unwrap_or(false)
    }
}

/// Translate a whole table for one adapter, excluding what the syntax cannot express.
#[must_use]
pub fn translate_spec(spec: &RouteSpec, adapter: &str, syntax: Syntax) -> TranslatedTable {
    let mut routes = Vec::with_capacity(spec.len());
    let mut excluded = Vec::new();
    let mut included = vec![false; spec.len()];

    for (index, route) in spec.routes().iter().enumerate() {
        match translate(route, index, adapter, syntax) {
            Ok(translated) => {
                included[index] = true;
                routes.push(translated);
            }
            Err(err) => {
                warn!(
                    adapter = %adapter,
                    method = %err.method,
                    pattern = %err.pattern,
                    feature = err.feature,
                    "Route excluded: pattern not expressible in router syntax"
                );
                excluded.push(err);
            }
        }
    }

    debug!(
        adapter = %adapter,
        canonical_count = spec.len(),
        effective_count = routes.len(),
        excluded_count = excluded.len(),
        "Route table translated"
    );

    TranslatedTable {
        adapter: adapter.to_string(),
        canonical_count: spec.len(),
        routes,
        excluded,
        included,
    }
}

/// Reference parser for native patterns.
///
/// Recovers the segment list from a pattern written in `style`, so a translation
/// can be checked against the canonical route it came from.
///
/// # Errors
///
/// The same structural errors as [`crate::spec::parse_canonical`].
pub fn parse_native(pattern: &str, style: ParamStyle) -> Result<Vec<Segment>, PatternError> {
    match style {
        ParamStyle::Colon => crate::spec::parse_canonical(pattern),
        ParamStyle::Brace => {
            let body = pattern
                .strip_prefix('/')
                .ok_or(PatternError::MissingLeadingSlash)?;
            if body.is_empty() {
                return Ok(Vec::new());
            }
            body.split('/')
                .map(|part| {
                    if part.is_empty() {
                        return Err(PatternError::EmptySegment);
                    }
                    let inner = part.strip_prefix('{').and_then(|p| p.strip_suffix('}'));
                    Ok(match inner {
                        Some(name) => match name.strip_prefix('*') {
                            Some(rest) => Segment::CatchAll(rest.to_string()),
                            None => Segment::Param(name.to_string()),
                        },
                        None => Segment::Static(part.to_string()),
                    })
                })
                .collect()
        }
    }
}
