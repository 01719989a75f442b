use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use docsmoke_core::constants::{EXTERNAL_LINK_PREFIX, INTERNAL_LINK_PREFIX};
use docsmoke_core::crawl::CrawlProgressCallback;
use docsmoke_core::report::{
    format_result_line, generate_crawl_report, generate_run_summary, write_reports,
};
use docsmoke_core::{
    BasePage, CrawlReport, ExternalPolicy, HttpSessionFactory, LinkCrawler, Project,
    ReporterKind, Runner, SessionFactory, SmokeError, SuiteConfig, TestCase, TestResult,
    factory_for,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::specs;

/// Logs go to stderr so they never interleave with report output.
/// `RUST_LOG` wins over the default level.
pub fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

// Argument helpers

/// Positional title filters, empty when none were given.
pub fn filters(args: &ArgMatches) -> Vec<String> {
    args.get_many::<String>("FILTER")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

pub fn project_names(args: &ArgMatches) -> Vec<String> {
    args.get_many::<String>("project")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Layer `run` flags over an environment-derived config. `--debug` is
/// applied last so it wins over explicit worker and retry counts.
pub fn apply_run_args(args: &ArgMatches, mut config: SuiteConfig) -> anyhow::Result<SuiteConfig> {
    if let Some(base_url) = args.get_one::<Url>("base-url") {
        config = config.with_base_url(base_url.as_str())?;
    }
    if let Some(workers) = args.get_one::<usize>("workers") {
        if *workers == 0 {
            bail!("--workers must be at least 1");
        }
        config.workers = Some(*workers);
    }
    if let Some(retries) = args.get_one::<u32>("retries") {
        config.retries = *retries;
    }
    if let Some(reporters) = args.get_many::<String>("reporter") {
        let mut kinds = Vec::new();
        for name in reporters {
            let kind: ReporterKind = name.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        config.reporters = kinds;
    }
    if let Some(backend) = args.get_one::<String>("backend") {
        config.backend = backend.parse()?;
    }
    if let Some(endpoint) = args.get_one::<String>("webdriver-url") {
        config.webdriver_url = endpoint.clone();
    }
    if args.get_flag("headed") {
        config.headed = true;
    }
    if let Some(output) = args.get_one::<String>("output-dir") {
        let expanded = shellexpand::tilde(output);
        config.output_dir = PathBuf::from(expanded.as_ref());
    }
    if args.get_flag("debug") {
        config = config.debug_mode();
    }
    Ok(config)
}

// Subcommand handlers

/// Run the suite. Returns whether every test passed (flaky counts as
/// passed).
pub async fn handle_run(args: &ArgMatches, quiet: bool) -> anyhow::Result<bool> {
    let config = apply_run_args(args, SuiteConfig::from_env()?)?;
    let projects = config.select_projects(&project_names(args))?;
    let cases = specs::registry().filter(&filters(args));
    if cases.is_empty() {
        bail!("no tests match the given filter");
    }

    let factory = factory_for(&config)?;
    info!(
        "Running {} tests x {} projects against {} ({} backend)",
        cases.len(),
        projects.len(),
        config.base_url,
        factory.name()
    );

    let live = !quiet && config.reporters.contains(&ReporterKind::List);
    if live {
        print_divider();
        println!(
            "  {} {} tests across {} projects",
            "Running".bright_white().bold(),
            cases.len() * projects.len(),
            projects.len()
        );
        println!("  {} {}", "Target:".blue(), config.base_url);
        print_divider();
    }

    let config = Arc::new(config);
    let mut runner = Runner::new(config.clone(), factory);
    if live {
        runner = runner.with_result_callback(Arc::new(|result: &TestResult| {
            println!("{}", format_result_line(result));
        }));
    }

    let summary = runner.run(&cases, &projects).await;

    println!("{}", generate_run_summary(&summary));
    let written = write_reports(&summary, &config.reporters, &config)
        .context("failed to write reports")?;
    if !quiet {
        for path in written {
            println!("{} {}", "→".blue(), path.display());
        }
    }

    Ok(summary.success())
}

/// Print every scheduled (project, test) pair without running anything.
pub fn handle_list(args: &ArgMatches) -> anyhow::Result<()> {
    let config = SuiteConfig::from_env()?;
    let projects = config.select_projects(&project_names(args))?;
    let cases = specs::registry().filter(&filters(args));

    for line in list_lines(&cases, &projects) {
        println!("{}", line);
    }
    println!(
        "\nTotal: {} tests in {} projects",
        cases.len() * projects.len(),
        projects.len()
    );
    Ok(())
}

/// `[project] suite › title`, project-major like the run schedule.
pub fn list_lines(cases: &[TestCase], projects: &[Project]) -> Vec<String> {
    projects
        .iter()
        .flat_map(|project| {
            cases
                .iter()
                .map(move |case| format!("  [{}] {}", project.name, case.full_title()))
        })
        .collect()
}

/// Crawl one page's links outside the suite. Returns whether the page is
/// healthy.
pub async fn handle_crawl(args: &ArgMatches, quiet: bool) -> anyhow::Result<bool> {
    let url = args
        .get_one::<Url>("url")
        .context("--url is required")?
        .clone();
    let limit = *args.get_one::<usize>("limit").unwrap_or(&20);
    let policy: ExternalPolicy = args
        .get_one::<String>("external")
        .map(|p| p.parse::<ExternalPolicy>())
        .transpose()?
        .unwrap_or_default();

    let config = SuiteConfig::local().with_base_url(url.as_str())?;
    let project = config
        .projects
        .first()
        .cloned()
        .context("no projects configured")?;
    let session = HttpSessionFactory
        .open(&project, config.session_options(&project))
        .await?;
    let page = BasePage::new(session.clone(), config.artifacts_dir().join("crawl"));

    if !quiet {
        println!(
            "\n{} {} (limit {}, external links: {:?})\n",
            "Crawling".bright_white().bold(),
            url,
            limit,
            policy
        );
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    if quiet {
        spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    spinner.enable_steady_tick(Duration::from_millis(100));

    let spinner_clone = spinner.clone();
    let progress: CrawlProgressCallback = Arc::new(move |message: String| {
        spinner_clone.set_message(message);
    });
    let crawler = LinkCrawler::new(limit)
        .with_external_policy(policy)
        .with_progress_callback(progress);

    let mut merged = CrawlReport {
        origin: url.to_string(),
        records: Vec::new(),
    };
    for prefix in [INTERNAL_LINK_PREFIX, EXTERNAL_LINK_PREFIX] {
        match crawler.crawl(&page, url.as_str(), prefix).await {
            Ok(report) => {
                merged.origin = report.origin;
                merged.records.extend(report.records);
            }
            Err(SmokeError::Precondition(message)) => {
                warn!("No links with prefix '{}': {}", prefix, message);
            }
            Err(e) => {
                spinner.finish_and_clear();
                session.close().await.ok();
                return Err(e.into());
            }
        }
    }
    spinner.finish_and_clear();

    print!("{}", generate_crawl_report(&merged));
    let healthy = match merged.assert_healthy(crawler.timeout_tolerance()) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            false
        }
    };

    if let Err(e) = session.close().await {
        warn!("Failed to close crawl session: {}", e);
    }
    Ok(healthy)
}

pub fn handle_projects() {
    print_divider();
    println!("{}", "  PROJECTS".bright_white().bold());
    print_divider();
    for project in Project::default_matrix() {
        println!(
            "  {:<16} {:<10} {:>4}x{:<5} {}",
            project.name.bright_white(),
            project.browser.as_str(),
            project.viewport.width,
            project.viewport.height,
            if project.is_mobile { "mobile" } else { "desktop" }
        );
    }
}
