//! Linear regex route table.
//!
//! Each brace pattern is compiled into an anchored regex and requests are tested
//! against every route of the matching method in registration order. First match
//! wins. Lookup is O(n) in the number of routes, which is what makes this engine a
//! useful baseline next to the radix tree.

use http::Method;
use regex::Regex;
use std::sync::Arc;

use super::ParamVec;

/// Router that matches requests with one compiled regex per route
#[derive(Clone, Default)]
pub struct RegexRouter {
    /// method, compiled regex, route id, param names
    routes: Vec<(Method, Regex, usize, Vec<Arc<str>>)>,
}

impl RegexRouter {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and append `pattern` for `method`.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error for patterns that do not compile.
    pub fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        route_id: usize,
    ) -> Result<(), regex::Error> {
        let (regex, param_names) = Self::path_to_regex(pattern)?;
        self.routes.push((method, regex, route_id, param_names));
        Ok(())
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match a request to a route id and its parameters.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<(usize, ParamVec)> {
        for (m, regex, route_id, param_names) in &self.routes {
            if m != method {
                continue;
            }
            if let Some(captures) = regex.captures(path) {
                let mut params = ParamVec::new();
                for (i, name) in param_names.iter().enumerate() {
                    if let Some(val) = captures.get(i + 1) {
                        params.push((Arc::clone(name), val.as_str().to_string()));
                    }
                }
                return Some((*route_id, params));
            }
        }
        None
    }

    /// Convert a brace pattern to an anchored regex and its ordered parameter names.
    ///
    /// `/users/{id}` becomes `^/users/([^/]+)$`; a trailing `{*rest}` becomes `/(.+)`.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<Arc<str>>), regex::Error> {
        if path == "/" {
            return Ok((Regex::new(r"^/$")?, Vec::new()));
        }

        // Reserve space for the final regex string and parameter list
        let mut pattern = String::with_capacity(path.len() + 16);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            let inner = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'));
            match inner {
                Some(name) => {
                    if let Some(rest) = name.strip_prefix('*') {
                        pattern.push_str("/(.+)");
                        param_names.push(Arc::from(rest));
                    } else {
                        pattern.push_str("/([^/]+)");
                        param_names.push(Arc::from(name));
                    }
                }
                None if !segment.is_empty() => {
                    pattern.push('/');
                    pattern.push_str(&regex::escape(segment));
                }
                None => {}
            }
        }

        pattern.push('$');
        Ok((Regex::new(&pattern)?, param_names))
    }
}
