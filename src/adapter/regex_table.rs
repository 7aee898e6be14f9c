use super::core::{AdapterBuildError, Handler, RouteMatch, RouterAdapter};
use crate::router::RegexRouter;
use crate::translate::{Syntax, TranslatedRoute};
use http::Method;
use std::collections::HashSet;

/// Adapter for the in-tree linear [`RegexRouter`]. Brace syntax with catch-all.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexAdapter;

struct RegexHandler {
    router: RegexRouter,
}

impl Handler for RegexHandler {
    fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.router
            .route(method, path)
            .map(|(route, params)| RouteMatch { route, params })
    }
}

impl RouterAdapter for RegexAdapter {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn syntax(&self) -> Syntax {
        Syntax::BRACE
    }

    fn build(&self, routes: &[TranslatedRoute]) -> Result<Box<dyn Handler>, AdapterBuildError> {
        let mut router = RegexRouter::new();
        // The linear table would accept a duplicate and never reach it
        let mut seen = HashSet::with_capacity(routes.len());
        for route in routes {
            if !seen.insert((&route.method, route.pattern.as_str())) {
                return Err(AdapterBuildError::DuplicateRoute {
                    adapter: self.name().to_string(),
                    method: route.method.to_string(),
                    pattern: route.pattern.clone(),
                });
            }
            router
                .insert(route.method.clone(), &route.pattern, route.index)
                .map_err(|e| AdapterBuildError::Engine {
                    adapter: self.name().to_string(),
                    method: route.method.to_string(),
                    pattern: route.pattern.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Box::new(RegexHandler { router }))
    }
}
