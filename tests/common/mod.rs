#![allow(dead_code)]

use brrtbench::config::BenchConfig;
use brrtbench::spec::{Route, RouteSpec};

/// Settings small enough for a debug-build test run
pub fn fast_config() -> BenchConfig {
    BenchConfig {
        warmup: 5,
        iterations: 40,
        samples: 4,
        memory_trials: 3,
        settle_ms: 0,
        ..BenchConfig::default()
    }
}

/// Build a table from `(method, pattern)` pairs
pub fn spec_of(name: &str, routes: &[(&str, &str)]) -> RouteSpec {
    let routes = routes
        .iter()
        .map(|(method, pattern)| Route::parse(method, pattern).unwrap())
        .collect();
    RouteSpec::new(name, routes).unwrap()
}

/// A small table with one route the radix adapter cannot express
pub fn catch_all_spec() -> RouteSpec {
    spec_of(
        "assets",
        &[
            ("GET", "/1/users"),
            ("GET", "/1/classes/:className"),
            ("GET", "/1/classes/:className/:objectId"),
            ("GET", "/static/*filepath"),
        ],
    )
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file ending in `.{ext}`
    pub fn create_temp_file(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrtb_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
