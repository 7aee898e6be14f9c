use super::error::{PatternError, RouteSpecError};
use http::Method;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One `/`-separated segment of a canonical pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Literal text matched exactly
    Static(String),
    /// `:name` - matches exactly one non-empty segment
    Param(String),
    /// `*name` - matches the non-empty remainder of the path
    CatchAll(String),
}

impl Segment {
    /// Parameter name for `Param` and `CatchAll` segments
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param(name) | Segment::CatchAll(name) => Some(name),
        }
    }

    /// Precedence rank used by the reference matcher: static < param < catch-all
    fn rank(&self) -> u8 {
        match self {
            Segment::Static(_) => 0,
            Segment::Param(_) => 1,
            Segment::CatchAll(_) => 2,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(text) => f.write_str(text),
            Segment::Param(name) => write!(f, ":{name}"),
            Segment::CatchAll(name) => write!(f, "*{name}"),
        }
    }
}

fn valid_param_name(name: &str) -> bool {
    name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parse a canonical pattern into its segments.
///
/// `/` parses to an empty segment list.
///
/// # Errors
///
/// Returns a [`PatternError`] describing the first structural problem found.
pub fn parse_canonical(pattern: &str) -> Result<Vec<Segment>, PatternError> {
    let body = pattern
        .strip_prefix('/')
        .ok_or(PatternError::MissingLeadingSlash)?;
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<&str> = body.split('/').collect();
    let mut segments = Vec::with_capacity(raw.len());
    let mut seen = HashSet::new();

    for (i, part) in raw.iter().enumerate() {
        if part.is_empty() {
            return Err(PatternError::EmptySegment);
        }
        let segment = if let Some(name) = part.strip_prefix(':') {
            Segment::Param(name.to_string())
        } else if let Some(name) = part.strip_prefix('*') {
            if i + 1 != raw.len() {
                return Err(PatternError::CatchAllNotLast {
                    name: name.to_string(),
                });
            }
            Segment::CatchAll(name.to_string())
        } else {
            if part.contains(['{', '}', ':', '*']) {
                return Err(PatternError::ReservedCharacter {
                    segment: (*part).to_string(),
                });
            }
            Segment::Static((*part).to_string())
        };

        if let Some(name) = segment.param_name() {
            if name.is_empty() {
                return Err(PatternError::EmptyParamName);
            }
            if !valid_param_name(name) {
                return Err(PatternError::InvalidParamName {
                    name: name.to_string(),
                });
            }
            if !seen.insert(name.to_string()) {
                return Err(PatternError::DuplicateParamName {
                    name: name.to_string(),
                });
            }
        }
        segments.push(segment);
    }

    Ok(segments)
}

/// A single `(method, canonical pattern)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// HTTP method
    pub method: Method,
    /// Canonical pattern, e.g. `/1/classes/:className/:objectId`
    pub pattern: String,
    segments: Vec<Segment>,
}

impl Route {
    /// Build a route from a method and a canonical pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RouteSpecError::InvalidPattern`] when the pattern does not parse.
    pub fn new(method: Method, pattern: &str) -> Result<Self, RouteSpecError> {
        let segments =
            parse_canonical(pattern).map_err(|reason| RouteSpecError::InvalidPattern {
                method: method.to_string(),
                pattern: pattern.to_string(),
                reason,
            })?;
        Ok(Self {
            method,
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// Build a route from a textual method (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`RouteSpecError::InvalidMethod`] for methods that are not HTTP tokens,
    /// otherwise the same errors as [`Route::new`].
    pub fn parse(method: &str, pattern: &str) -> Result<Self, RouteSpecError> {
        let upper = method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(upper.as_bytes()).map_err(|_| {
            RouteSpecError::InvalidMethod {
                method: method.to_string(),
            }
        })?;
        Self::new(method, pattern)
    }

    /// Parsed segments of the pattern
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Ordered parameter names, catch-all included
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Number of parameters, catch-all included
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_names().count()
    }

    /// Whether the pattern ends in a `*name` segment
    #[must_use]
    pub fn has_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }

    /// Concrete request path exercising this route.
    ///
    /// The pattern text itself is the path: `/1/classes/:className` is requested as
    /// `/1/classes/:className`. Static segments never contain `:` or `*`, so a parameter
    /// value cannot collide with a sibling static route.
    #[must_use]
    pub fn sample_path(&self) -> String {
        self.sample_path_at_depth(0)
    }

    /// Like [`Route::sample_path`], with a catch-all value repeated until the path has
    /// at least `depth` segments.
    #[must_use]
    pub fn sample_path_at_depth(&self, depth: usize) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut path = String::with_capacity(self.pattern.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(text) => path.push_str(text),
                Segment::Param(name) => {
                    path.push(':');
                    path.push_str(name);
                }
                Segment::CatchAll(name) => {
                    let repeat = depth.saturating_sub(self.segments.len()) + 1;
                    for i in 0..repeat {
                        if i > 0 {
                            path.push('/');
                        }
                        path.push('*');
                        path.push_str(name);
                    }
                }
            }
        }
        path
    }

    /// Match a request path against this route.
    ///
    /// Returns the per-segment precedence ranks and the captured parameters.
    fn match_path(&self, parts: &[&str]) -> Option<(Vec<u8>, Vec<(String, String)>)> {
        let mut ranks = Vec::with_capacity(self.segments.len());
        let mut params = Vec::new();

        for (i, segment) in self.segments.iter().enumerate() {
            ranks.push(segment.rank());
            match segment {
                Segment::Static(text) => {
                    if parts.get(i)? != text {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i)?;
                    if value.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), (*value).to_string()));
                }
                Segment::CatchAll(name) => {
                    let rest = parts.get(i..)?.join("/");
                    if rest.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), rest));
                    return Some((ranks, params));
                }
            }
        }

        (parts.len() == self.segments.len()).then_some((ranks, params))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

/// Outcome of the reference matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMatch {
    /// Position of the matched route in the [`RouteSpec`]
    pub index: usize,
    /// Captured parameters in pattern order
    pub params: Vec<(String, String)>,
}

/// Ordered, validated route table shared by every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    name: String,
    routes: Vec<Route>,
}

impl RouteSpec {
    /// Build a table, rejecting empty tables and duplicate `(method, pattern)` pairs.
    ///
    /// # Errors
    ///
    /// [`RouteSpecError::EmptyTable`] or [`RouteSpecError::DuplicateRoute`].
    pub fn new(name: impl Into<String>, routes: Vec<Route>) -> Result<Self, RouteSpecError> {
        let name = name.into();
        if routes.is_empty() {
            return Err(RouteSpecError::EmptyTable { name });
        }

        let mut seen = HashSet::with_capacity(routes.len());
        for route in &routes {
            if !seen.insert((&route.method, route.pattern.as_str())) {
                return Err(RouteSpecError::DuplicateRoute {
                    method: route.method.to_string(),
                    pattern: route.pattern.clone(),
                });
            }
        }

        Ok(Self { name, routes })
    }

    /// Table name used in report headers
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Routes in registration order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Always false for a constructed table; present for API symmetry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// One request path per route, in table order, each resolving to its own route.
    ///
    /// Catch-all values are padded one segment past the deepest route so that no
    /// fixed-depth route can claim them.
    #[must_use]
    pub fn sweep_paths(&self) -> Vec<String> {
        let depth = self
            .routes
            .iter()
            .map(|r| r.segments.len())
            .max()
            .unwrap_or_default()
            + 1;
        self.routes
            .iter()
            .map(|route| {
                if route.has_catch_all() {
                    route.sample_path_at_depth(depth)
                } else {
                    route.sample_path()
                }
            })
            .collect()
    }

    /// Reference matcher over the whole table.
    ///
    /// Precedence is per segment, static over parameter over catch-all, with
    /// backtracking. Registration order only breaks ties between structurally
    /// identical patterns.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ReferenceMatch> {
        self.resolve_where(method, path, |_| true)
    }

    /// Reference matcher restricted to the routes whose index passes `include`.
    #[must_use]
    pub fn resolve_where<F>(
        &self,
        method: &Method,
        path: &str,
        include: F,
    ) -> Option<ReferenceMatch>
    where
        F: Fn(usize) -> bool,
    {
        let body = path.strip_prefix('/')?;
        let parts: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('/').collect()
        };

        let mut best: Option<(Vec<u8>, ReferenceMatch)> = None;
        for (index, route) in self.routes.iter().enumerate() {
            if route.method != *method || !include(index) {
                continue;
            }
            let Some((ranks, params)) = route.match_path(&parts) else {
                continue;
            };
            let better = match &best {
                Some((best_ranks, _)) => ranks < *best_ranks,
                None => true,
            };
            if better {
                best = Some((ranks, ReferenceMatch { index, params }));
            }
        }

        best.map(|(_, m)| m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(routes: &[(&str, &str)]) -> RouteSpec {
        let routes = routes
            .iter()
            .map(|(m, p)| Route::parse(m, p).unwrap())
            .collect();
        RouteSpec::new("test", routes).unwrap()
    }

    #[test]
    fn test_parse_canonical_segments() {
        let segments = parse_canonical("/1/classes/:className/:objectId").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Static("1".into()),
                Segment::Static("classes".into()),
                Segment::Param("className".into()),
                Segment::Param("objectId".into()),
            ]
        );
        assert!(parse_canonical("/").unwrap().is_empty());
    }

    #[test]
    fn test_parse_canonical_rejects_malformed() {
        assert_eq!(
            parse_canonical("users"),
            Err(PatternError::MissingLeadingSlash)
        );
        assert_eq!(parse_canonical("/a//b"), Err(PatternError::EmptySegment));
        assert_eq!(parse_canonical("/a/"), Err(PatternError::EmptySegment));
        assert_eq!(parse_canonical("/a/:"), Err(PatternError::EmptyParamName));
        assert!(matches!(
            parse_canonical("/a/*rest/b"),
            Err(PatternError::CatchAllNotLast { .. })
        ));
        assert!(matches!(
            parse_canonical("/a/:id/:id"),
            Err(PatternError::DuplicateParamName { .. })
        ));
        assert!(matches!(
            parse_canonical("/a/{id}"),
            Err(PatternError::ReservedCharacter { .. })
        ));
        assert!(matches!(
            parse_canonical("/a/:bad-name"),
            Err(PatternError::InvalidParamName { .. })
        ));
    }

    #[test]
    fn test_route_spec_rejects_duplicates() {
        let routes = vec![
            Route::parse("GET", "/1/users").unwrap(),
            Route::parse("get", "/1/users").unwrap(),
        ];
        assert!(matches!(
            RouteSpec::new("dup", routes),
            Err(RouteSpecError::DuplicateRoute { .. })
        ));
        assert!(matches!(
            RouteSpec::new("empty", Vec::new()),
            Err(RouteSpecError::EmptyTable { .. })
        ));
    }

    #[test]
    fn test_sample_path_uses_pattern_text() {
        let route = Route::parse("GET", "/1/classes/:className/:objectId").unwrap();
        assert_eq!(route.sample_path(), "/1/classes/:className/:objectId");
        let root = Route::parse("GET", "/").unwrap();
        assert_eq!(root.sample_path(), "/");
        let files = Route::parse("GET", "/static/*filepath").unwrap();
        assert_eq!(files.sample_path(), "/static/*filepath");
        assert_eq!(
            files.sample_path_at_depth(4),
            "/static/*filepath/*filepath/*filepath"
        );
    }

    #[test]
    fn test_sweep_paths_hit_every_route_once() {
        let table = spec(&[
            ("GET", "/1/things"),
            ("GET", "/1/things/:id"),
            ("GET", "/1/things/id"),
            ("GET", "/static/:file"),
            ("GET", "/static/:dir/:file"),
            ("GET", "/static/*filepath"),
            ("GET", "/"),
        ]);
        let paths = table.sweep_paths();
        assert_eq!(paths.len(), table.len());
        for (index, path) in paths.iter().enumerate() {
            let m = table.resolve(&Method::GET, path).unwrap();
            assert_eq!(m.index, index, "{path}");
        }
    }

    #[test]
    fn test_resolve_prefers_static_over_param() {
        let table = spec(&[
            ("GET", "/users/:id"),
            ("GET", "/users/me"),
            ("GET", "/files/*path"),
        ]);
        let m = table.resolve(&Method::GET, "/users/me").unwrap();
        assert_eq!(m.index, 1);
        assert!(m.params.is_empty());

        let m = table.resolve(&Method::GET, "/users/42").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.params, vec![("id".to_string(), "42".to_string())]);

        let m = table.resolve(&Method::GET, "/files/a/b.txt").unwrap();
        assert_eq!(m.params, vec![("path".to_string(), "a/b.txt".to_string())]);
        assert!(table.resolve(&Method::GET, "/files").is_none());
        assert!(table.resolve(&Method::POST, "/users/42").is_none());
    }

    #[test]
    fn test_resolve_where_skips_excluded_routes() {
        let table = spec(&[("GET", "/users/me"), ("GET", "/users/:id")]);
        let m = table
            .resolve_where(&Method::GET, "/users/me", |i| i != 0)
            .unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.params, vec![("id".to_string(), "me".to_string())]);
    }
}
