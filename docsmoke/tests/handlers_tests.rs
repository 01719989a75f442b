use docsmoke::commands::command_argument_builder;
use docsmoke::handlers::*;
use docsmoke::specs;
use docsmoke_core::{Backend, Project, ReporterKind, SuiteConfig};
use docsmoke_browser::BrowserKind;
use std::path::PathBuf;
use std::time::Duration;

fn run_args(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["docsmoke", "run"];
    argv.extend_from_slice(args);
    let matches = command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap();
    matches.subcommand_matches("run").unwrap().clone()
}

// ============================================================================
// Command line parsing
// ============================================================================

#[test]
fn test_subcommand_is_required() {
    let result = command_argument_builder().try_get_matches_from(["docsmoke"]);
    assert!(result.is_err());
}

#[test]
fn test_quiet_is_global() {
    let matches = command_argument_builder()
        .try_get_matches_from(["docsmoke", "run", "--quiet"])
        .unwrap();
    assert!(matches.get_flag("quiet"));
}

#[test]
fn test_unknown_reporter_is_rejected() {
    let result =
        command_argument_builder().try_get_matches_from(["docsmoke", "run", "-r", "tap"]);
    assert!(result.is_err());
}

#[test]
fn test_crawl_requires_url() {
    let result = command_argument_builder().try_get_matches_from(["docsmoke", "crawl"]);
    assert!(result.is_err());

    let matches = command_argument_builder()
        .try_get_matches_from(["docsmoke", "crawl", "-u", "https://docs.example.com/"])
        .unwrap();
    let crawl = matches.subcommand_matches("crawl").unwrap();
    assert_eq!(*crawl.get_one::<usize>("limit").unwrap(), 20);
    assert_eq!(crawl.get_one::<String>("external").unwrap(), "skip");
}

#[test]
fn test_filters_and_projects() {
    let args = run_args(&["smoke", "links", "-p", "firefox", "-p", "webkit"]);
    assert_eq!(filters(&args), vec!["smoke", "links"]);
    assert_eq!(project_names(&args), vec!["firefox", "webkit"]);

    let args = run_args(&[]);
    assert!(filters(&args).is_empty());
    assert!(project_names(&args).is_empty());
}

// ============================================================================
// Run configuration
// ============================================================================

#[test]
fn test_apply_run_args_defaults_keep_config() {
    let config = apply_run_args(&run_args(&[]), SuiteConfig::local()).unwrap();
    let local = SuiteConfig::local();

    assert_eq!(config.base_url, local.base_url);
    assert_eq!(config.workers, None);
    assert_eq!(config.retries, 0);
    assert_eq!(config.backend, Backend::Http);
    assert_eq!(config.reporters, local.reporters);
    assert_eq!(config.output_dir, PathBuf::from("test-results"));
}

#[test]
fn test_apply_run_args_overrides() {
    let args = run_args(&[
        "--base-url",
        "https://docs.example.com",
        "-w",
        "4",
        "--retries",
        "1",
        "-r",
        "json,junit,json",
        "--webdriver-url",
        "http://grid:4444",
        "-o",
        "out",
    ]);
    let config = apply_run_args(&args, SuiteConfig::local()).unwrap();

    assert_eq!(config.base_url.as_str(), "https://docs.example.com/");
    assert_eq!(config.workers, Some(4));
    assert_eq!(config.retries, 1);
    assert_eq!(config.reporters, vec![ReporterKind::Json, ReporterKind::Junit]);
    assert_eq!(config.webdriver_url, "http://grid:4444");
    assert_eq!(config.output_dir, PathBuf::from("out"));
}

#[test]
fn test_apply_run_args_flags_override_ci_environment() {
    let ci = SuiteConfig::from_vars(|key| (key == "CI").then(|| "true".to_string())).unwrap();
    assert_eq!(ci.retries, 2);

    let config = apply_run_args(&run_args(&["--retries", "0"]), ci).unwrap();
    assert_eq!(config.retries, 0);
    assert_eq!(config.workers, Some(2));
}

#[test]
fn test_debug_wins_over_workers() {
    let args = run_args(&["--debug", "-w", "8", "--retries", "3"]);
    let config = apply_run_args(&args, SuiteConfig::local()).unwrap();

    assert!(config.headed);
    assert_eq!(config.workers, Some(1));
    assert_eq!(config.retries, 0);
    assert!(config.test_timeout > Duration::from_secs(60));
}

#[test]
fn test_zero_workers_is_an_error() {
    let result = apply_run_args(&run_args(&["-w", "0"]), SuiteConfig::local());
    assert!(result.is_err());
}

#[test]
fn test_output_dir_expands_tilde() {
    let config = apply_run_args(&run_args(&["-o", "~/smoke"]), SuiteConfig::local()).unwrap();
    assert!(!config.output_dir.to_string_lossy().starts_with('~'));
    assert!(config.output_dir.ends_with("smoke"));
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_lines_are_project_major() {
    let cases = specs::registry().filter(&["homepage loads".to_string()]);
    let projects = vec![
        Project::desktop("chromium", BrowserKind::Chromium),
        Project::desktop("firefox", BrowserKind::Firefox),
    ];

    let lines = list_lines(&cases, &projects);
    assert_eq!(
        lines,
        vec![
            "  [chromium] Smoke › homepage loads",
            "  [firefox] Smoke › homepage loads",
        ]
    );
}

#[test]
fn test_handle_list_rejects_unknown_project() {
    let matches = command_argument_builder()
        .try_get_matches_from(["docsmoke", "list", "-p", "netscape"])
        .unwrap();
    let list = matches.subcommand_matches("list").unwrap();
    let result = handle_list(list);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("netscape"));
}
