//! Radix tree implementation for efficient HTTP route matching
//!
//! This module provides a radix tree (also called compact prefix tree) for O(k)
//! route matching where k is the path length. Patterns use brace syntax
//! (`/users/{id}`) and every parameter occupies a whole segment. There is no
//! catch-all support: the tree only matches fixed-depth paths.
//!
//! ## Implementation Details
//!
//! The radix tree is built by splitting paths into segments and creating a tree
//! structure where:
//! - Each node represents a path segment
//! - Static segments (e.g., `users`) match exactly
//! - Parameter segments (e.g., `{id}`) match any value
//! - Routes are stored at terminal nodes, keyed by HTTP method
//!
//! Static children are always tried before parameter children, with backtracking.

use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::ParamVec;

/// Path segments of typical REST routes fit on the stack.
type SegmentVec<'a> = SmallVec<[&'a str; 16]>;

/// Error raised while inserting a pattern into the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadixInsertError {
    /// The same method and pattern were inserted twice
    Duplicate {
        /// HTTP method
        method: Method,
        /// Pattern inserted twice
        pattern: String,
    },
    /// `{*name}` segments cannot be represented
    CatchAllUnsupported {
        /// Offending pattern
        pattern: String,
    },
}

impl fmt::Display for RadixInsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadixInsertError::Duplicate { method, pattern } => {
                write!(f, "route {method} {pattern} is already registered")
            }
            RadixInsertError::CatchAllUnsupported { pattern } => {
                write!(f, "catch-all segments are not supported: {pattern}")
            }
        }
    }
}

impl std::error::Error for RadixInsertError {}

/// Node in the radix tree for efficient route matching
///
/// Each node represents a segment of a URL path and can have children
/// that share common prefixes.
#[derive(Clone)]
struct RadixNode {
    /// The path segment this node represents (without leading /)
    segment: Cow<'static, str>,
    /// If this node is a terminal (end of a route), stores the route id per HTTP method
    routes: HashMap<Method, usize>,
    /// Parameter name if this segment is a path parameter (e.g., "{id}" -> Some("id"))
    ///
    /// `Arc<str>` so a match clones a pointer, not the name.
    param_name: Option<Arc<str>>,
    /// Child nodes for more specific paths
    children: Vec<RadixNode>,
    /// Parameter child nodes. Several are kept so routes with different parameter
    /// names at the same position (`/users/{id}/posts` vs `/users/{user_id}/comments`)
    /// each extract their own name.
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            routes: HashMap::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(param_name: &str) -> Self {
        Self {
            segment: Cow::Borrowed(""),
            routes: HashMap::new(),
            param_name: Some(Arc::from(param_name)),
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    /// Insert a route into the tree, returning `false` if the method is already
    /// registered at the terminal node.
    fn insert(&mut self, segments: &[&str], method: Method, route_id: usize) -> bool {
        let Some((&segment, remaining)) = segments.split_first() else {
            if self.routes.contains_key(&method) {
                return false;
            }
            self.routes.insert(method, route_id);
            return true;
        };

        if let Some(param_name) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            // Reuse a parameter child only when the name matches
            for param_child in &mut self.param_children {
                if param_child.param_name.as_deref() == Some(param_name) {
                    return param_child.insert(remaining, method, route_id);
                }
            }

            let mut child = RadixNode::new_param(param_name);
            let inserted = child.insert(remaining, method, route_id);
            self.param_children.push(child);
            return inserted;
        }

        for child in &mut self.children {
            if child.segment == segment {
                return child.insert(remaining, method, route_id);
            }
        }

        let mut child = RadixNode::new(Cow::Owned(segment.to_string()));
        let inserted = child.insert(remaining, method, route_id);
        self.children.push(child);
        inserted
    }

    /// Search for a matching route in the tree
    fn search(&self, segments: &[&str], method: &Method, params: &mut ParamVec) -> Option<usize> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.get(method).copied();
        };

        // First, try exact match with static children
        for child in &self.children {
            if child.segment == segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        // If no exact match, try all parameter children
        for param_child in &self.param_children {
            if let Some(param_name) = &param_child.param_name {
                params.push((Arc::clone(param_name), segment.to_string()));
                if let Some(route) = param_child.search(remaining, method, params) {
                    return Some(route);
                }
                // Backtrack: remove the parameter if the search fails
                params.pop();
            }
        }

        None
    }
}

fn split_segments(path: &str) -> SegmentVec<'_> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

/// Radix tree-based router for O(k) route matching
///
/// - Insertion: O(k) where k is the path length
/// - Lookup: O(k) where k is the path length
/// - Memory: shared prefixes are stored once
#[derive(Clone)]
pub struct RadixRouter {
    /// Root node of the radix tree
    root: RadixNode,
    len: usize,
}

impl Default for RadixRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixRouter {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(Cow::Borrowed("")),
            len: 0,
        }
    }

    /// Register `pattern` for `method`; `route_id` is returned on match.
    ///
    /// # Errors
    ///
    /// [`RadixInsertError::CatchAllUnsupported`] for `{*name}` segments and
    /// [`RadixInsertError::Duplicate`] when the method/pattern pair exists.
    pub fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        route_id: usize,
    ) -> Result<(), RadixInsertError> {
        if pattern.contains("{*") {
            return Err(RadixInsertError::CatchAllUnsupported {
                pattern: pattern.to_string(),
            });
        }

        let segments = split_segments(pattern);
        if !self.root.insert(&segments, method.clone(), route_id) {
            return Err(RadixInsertError::Duplicate {
                method,
                pattern: pattern.to_string(),
            });
        }
        self.len += 1;
        Ok(())
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Match a request to a route id and its parameters.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<(usize, ParamVec)> {
        let segments = split_segments(path);
        let mut params = ParamVec::new();
        let route = self.root.search(&segments, method, &mut params)?;
        Some((route, params))
    }
}
