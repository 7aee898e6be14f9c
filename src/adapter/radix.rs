use super::core::{AdapterBuildError, Handler, RouteMatch, RouterAdapter};
use crate::router::{RadixInsertError, RadixRouter};
use crate::translate::{Syntax, TranslatedRoute};
use http::Method;

/// Adapter for the in-tree [`RadixRouter`]. Brace syntax, no catch-all.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadixAdapter;

struct RadixHandler {
    router: RadixRouter,
}

impl Handler for RadixHandler {
    fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.router
            .route(method, path)
            .map(|(route, params)| RouteMatch { route, params })
    }
}

impl RouterAdapter for RadixAdapter {
    fn name(&self) -> &'static str {
        "radix"
    }

    fn syntax(&self) -> Syntax {
        Syntax::BRACE.without_catch_all()
    }

    fn build(&self, routes: &[TranslatedRoute]) -> Result<Box<dyn Handler>, AdapterBuildError> {
        let mut router = RadixRouter::new();
        for route in routes {
            router
                .insert(route.method.clone(), &route.pattern, route.index)
                .map_err(|e| match e {
                    RadixInsertError::Duplicate { .. } => AdapterBuildError::DuplicateRoute {
                        adapter: self.name().to_string(),
                        method: route.method.to_string(),
                        pattern: route.pattern.clone(),
                    },
                    RadixInsertError::CatchAllUnsupported { .. } => AdapterBuildError::Engine {
                        adapter: self.name().to_string(),
                        method: route.method.to_string(),
                        pattern: route.pattern.clone(),
                        reason: e.to_string(),
                    },
                })?;
        }
        Ok(Box::new(RadixHandler { router }))
    }
}
