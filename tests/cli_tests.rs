//! Runs the compiled `brrtbench` binary.

mod common;

use common::temp_files::create_temp_file;
use std::process::{Command, Output};

fn brrtbench(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_brrtbench"))
        .args(args)
        .env_remove("BRRTB_CONFIG")
        .env_remove("BRRTB_ROUTES")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run brrtbench")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_adapters_command() {
    let output = brrtbench(&["adapters"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let names: Vec<&str> = text
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(names, vec!["radix", "regex", "matchit"]);
    assert!(text.contains("no catch-all"));
}

#[test]
fn test_routes_json() {
    let output = brrtbench(&["routes", "--format", "json", "--adapter", "regex"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let listings = json.as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["adapter"], "regex");
    assert_eq!(listings[0]["effective_routes"], 26);
    assert_eq!(
        listings[0]["routes"][1]["pattern"],
        "/1/classes/{className}/{objectId}"
    );
}

#[test]
fn test_run_json_with_tiny_settings() {
    let output = brrtbench(&[
        "run",
        "--format",
        "json",
        "--warmup",
        "2",
        "--iterations",
        "20",
        "--samples",
        "2",
        "--memory-trials",
        "3",
        "--settle-ms",
        "0",
    ]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["settings"]["iterations"], 20);
    let adapters = json["adapters"].as_array().unwrap();
    assert_eq!(adapters.len(), 3);
    for adapter in adapters {
        assert_eq!(adapter["results"].as_array().unwrap().len(), 4);
        assert!(adapter["memory"]["median_bytes"].as_u64().unwrap() > 0);
    }
}

#[test]
fn test_run_text_with_route_file() {
    let routes = create_temp_file(
        r#"
name = "mini"

[[routes]]
method = "GET"
path = "/1/users"

[[routes]]
method = "GET"
path = "/1/classes/:className"

[[routes]]
method = "GET"
path = "/1/classes/:className/:objectId"
"#,
        "toml",
    );
    let routes_path = routes.path().to_str().unwrap();
    let output = brrtbench(&[
        "run",
        "-r",
        routes_path,
        "-a",
        "radix,matchit",
        "--iterations",
        "10",
        "--samples",
        "2",
        "--memory-trials",
        "3",
        "--settle-ms",
        "0",
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("route table 'mini' (3 routes)"), "{text}");
    assert!(text.contains("radix"));
    assert!(text.contains("matchit"));
    assert!(!text.contains("regex "));
}

#[test]
fn test_check_command_passes_on_builtin_table() {
    let output = brrtbench(&["check"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("radix: 26/26 routes, ok"));
    assert!(text.contains("matchit: 26/26 routes, ok"));
}

#[test]
fn test_unknown_adapter_fails() {
    let output = brrtbench(&["routes", "--adapter", "nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope"), "{stderr}");
}

#[test]
fn test_invalid_env_override_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_brrtbench"))
        .args(["run", "--iterations", "5", "--samples", "1"])
        .env("BRRTB_WARMUP", "many")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("BRRTB_WARMUP"));
}
