//! Unit tests for CLI commands

use crate::cli::{build_config, run_cli, BenchArgs, Cli, Commands, SourceArgs};
use crate::report::OutputFormat;
use clap::Parser;

fn output_of(args: &[&str]) -> (anyhow::Result<()>, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let result = run_cli(cli, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_run_command_with_flags() {
    let cli = Cli::try_parse_from([
        "brrtbench",
        "run",
        "--adapter",
        "radix,matchit",
        "--iterations",
        "500",
        "--samples",
        "5",
        "--format",
        "json",
    ])
    .unwrap();

    match cli.command {
        Commands::Run {
            source,
            bench,
            format,
        } => {
            assert_eq!(source.adapters, vec!["radix", "matchit"]);
            assert_eq!(bench.iterations, Some(500));
            assert_eq!(bench.samples, Some(5));
            assert_eq!(format, OutputFormat::Json);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["brrtbench", "run"],
        vec!["brrtbench", "-vv", "routes", "--format", "json"],
        vec!["brrtbench", "check", "-a", "regex"],
        vec!["brrtbench", "adapters"],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[test]
fn test_verbose_raises_log_level() {
    let cli = Cli::try_parse_from(["brrtbench", "-vv", "adapters"]).unwrap();
    assert_eq!(cli.log_config().log_level, "debug");
}

#[test]
fn test_flags_override_defaults() {
    let source = SourceArgs::default();
    let bench = BenchArgs {
        warmup: Some(3),
        iterations: Some(30),
        samples: Some(3),
        ..BenchArgs::default()
    };
    let config = build_config(&source, Some(&bench)).unwrap();
    assert_eq!(config.warmup, 3);
    assert_eq!(config.iterations, 30);
    assert_eq!(config.samples, 3);
}

#[test]
fn test_flags_are_validated() {
    let bench = BenchArgs {
        iterations: Some(2),
        samples: Some(4),
        ..BenchArgs::default()
    };
    assert!(build_config(&SourceArgs::default(), Some(&bench)).is_err());
}

#[test]
fn test_adapters_lists_builtins() {
    let (result, out) = output_of(&["brrtbench", "adapters"]);
    result.unwrap();
    let names: Vec<_> = out.lines().filter_map(|l| l.split_whitespace().next()).collect();
    assert_eq!(names, ["radix", "regex", "matchit"]);
    assert!(out.contains("{name}, no catch-all"));
}

#[test]
fn test_routes_text_lists_translated_patterns() {
    let (result, out) = output_of(&["brrtbench", "routes", "--adapter", "matchit"]);
    result.unwrap();
    assert!(out.starts_with("matchit (:name, *name): 26/26 routes"));
    assert!(out.contains("/1/classes/:className/:objectId"));
    assert!(!out.contains("radix"));
}

#[test]
fn test_unknown_adapter_is_an_error() {
    let (result, _) = output_of(&["brrtbench", "routes", "--adapter", "nope"]);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("unknown adapter 'nope'"), "{err}");
}

#[test]
fn test_check_passes_on_parse_api() {
    let (result, out) = output_of(&["brrtbench", "check"]);
    result.unwrap();
    assert!(out.contains("radix: 26/26 routes, ok"), "{out}");
    assert!(out.contains("regex: 26/26 routes, ok"), "{out}");
    assert!(out.contains("matchit: 26/26 routes, ok"), "{out}");
}
