use super::types::{Route, RouteSpec};

/// The Parse REST API route set (26 routes, no overlapping patterns).
pub const PARSE_API_ROUTES: &[(&str, &str)] = &[
    // Objects
    ("POST", "/1/classes/:className"),
    ("GET", "/1/classes/:className/:objectId"),
    ("PUT", "/1/classes/:className/:objectId"),
    ("GET", "/1/classes/:className"),
    ("DELETE", "/1/classes/:className/:objectId"),
    // Users
    ("POST", "/1/users"),
    ("GET", "/1/login"),
    ("GET", "/1/users/:objectId"),
    ("PUT", "/1/users/:objectId"),
    ("GET", "/1/users"),
    ("DELETE", "/1/users/:objectId"),
    ("POST", "/1/requestPasswordReset"),
    // Roles
    ("POST", "/1/roles"),
    ("GET", "/1/roles/:objectId"),
    ("PUT", "/1/roles/:objectId"),
    ("GET", "/1/roles"),
    ("DELETE", "/1/roles/:objectId"),
    // Files
    ("POST", "/1/files/:fileName"),
    // Analytics
    ("POST", "/1/events/:eventName"),
    // Push Notifications
    ("POST", "/1/push"),
    // Installations
    ("POST", "/1/installations"),
    ("GET", "/1/installations/:objectId"),
    ("PUT", "/1/installations/:objectId"),
    ("GET", "/1/installations"),
    ("DELETE", "/1/installations/:objectId"),
    // Cloud Functions
    ("POST", "/1/functions"),
];

/// The built-in Parse API table.
#[must_use]
#[allow(clippy::expect_used)]
pub fn parse_api() -> RouteSpec {
    let routes = PARSE_API_ROUTES
        .iter()
        .map(|(method, pattern)| {
            Route::parse(method, pattern).expect("Parse API route is canonical")
        })
        .collect();
    RouteSpec::new("parse", routes).expect("Parse API table has no duplicates")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_parse_api_has_all_routes() {
        let spec = parse_api();
        assert_eq!(spec.len(), PARSE_API_ROUTES.len());
        assert_eq!(spec.len(), 26);
        assert_eq!(spec.name(), "parse");
    }

    #[test]
    fn test_parse_api_scenario_paths_resolve() {
        let spec = parse_api();
        let m = spec.resolve(&Method::GET, "/1/users").unwrap();
        assert!(m.params.is_empty());
        let m = spec.resolve(&Method::GET, "/1/classes/go").unwrap();
        assert_eq!(m.params.len(), 1);
        let m = spec.resolve(&Method::GET, "/1/classes/go/123456789").unwrap();
        assert_eq!(
            m.params,
            vec![
                ("className".to_string(), "go".to_string()),
                ("objectId".to_string(), "123456789".to_string()),
            ]
        );
    }
}
