use super::core::{AdapterBuildError, Handler, RouteMatch, RouterAdapter};
use crate::router::ParamVec;
use crate::translate::{Syntax, TranslatedRoute};
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Adapter for the `matchit` radix tree. Colon syntax with catch-all.
///
/// `matchit` routes paths only, so the handler keeps one tree per method.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchitAdapter;

struct MatchitHandler {
    trees: HashMap<Method, matchit::Router<usize>>,
    /// Parameter names indexed by canonical route index
    names: Vec<Vec<Arc<str>>>,
}

impl Handler for MatchitHandler {
    fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let matched = self.trees.get(method)?.at(path).ok()?;
        let route = *matched.value;

        // matchit yields parameters in pattern order; reuse the interned names
        let mut params = ParamVec::new();
        if let Some(names) = self.names.get(route) {
            for (name, (_, value)) in names.iter().zip(matched.params.iter()) {
                params.push((Arc::clone(name), value.to_string()));
            }
        }
        Some(RouteMatch { route, params })
    }
}

impl RouterAdapter for MatchitAdapter {
    fn name(&self) -> &'static str {
        "matchit"
    }

    fn syntax(&self) -> Syntax {
        Syntax::COLON
    }

    fn build(&self, routes: &[TranslatedRoute]) -> Result<Box<dyn Handler>, AdapterBuildError> {
        let mut trees: HashMap<Method, matchit::Router<usize>> = HashMap::new();
        let slots = routes.iter().map(|r| r.index + 1).max().unwrap_or(0);
        let mut names: Vec<Vec<Arc<str>>> = vec![Vec::new(); slots];

        for route in routes {
            let tree = trees
                .entry(route.method.clone())
                .or_insert_with(matchit::Router::new);
            tree.insert(route.pattern.as_str(), route.index)
                .map_err(|e| match e {
                    matchit::InsertError::Conflict { with } if with == route.pattern => {
                        AdapterBuildError::DuplicateRoute {
                            adapter: self.name().to_string(),
                            method: route.method.to_string(),
                            pattern: route.pattern.clone(),
                        }
                    }
                    other => AdapterBuildError::Engine {
                        adapter: self.name().to_string(),
                        method: route.method.to_string(),
                        pattern: route.pattern.clone(),
                        reason: other.to_string(),
                    },
                })?;
            names[route.index] = route
                .param_names
                .iter()
                .map(|n| Arc::from(n.as_str()))
                .collect();
        }

        Ok(Box::new(MatchitHandler { trees, names }))
    }
}
