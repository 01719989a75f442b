use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("docsmoke")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("docsmoke")
        .about("Browser smoke suite for documentation sites")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Only print failures and the final summary")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("run")
                .about("Run the smoke suite against the target site")
                .arg(
                    arg!([FILTER] ...)
                        .required(false)
                        .help("Only run tests whose title contains one of these strings"),
                )
                .arg(
                    arg!(-p --"project" <NAME>)
                        .required(false)
                        .help("Browser/device project to run (repeatable; default: all)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"headed")
                        .required(false)
                        .help("Show the browser window (webdriver backend only)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"debug")
                        .required(false)
                        .help("Headed, one worker, no retries and no test timeout pressure")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-r --"reporter" <REPORTERS>)
                        .required(false)
                        .help("Comma-separated reporters: list, html, json, junit")
                        .value_delimiter(',')
                        .value_parser(["list", "html", "json", "junit"]),
                )
                .arg(
                    arg!(--"base-url" <URL>)
                        .required(false)
                        .help("Target origin (overrides BASE_URL)")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-w --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("Maximum number of tests running at once (default: unbounded, 2 on CI)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"retries" <COUNT>)
                        .required(false)
                        .help("Retries for a failed test (default: 0, 2 on CI)")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--"backend" <BACKEND>)
                        .required(false)
                        .help("Session backend")
                        .value_parser(["http", "webdriver"])
                        .default_value("http"),
                )
                .arg(
                    arg!(--"webdriver-url" <URL>)
                        .required(false)
                        .help("WebDriver endpoint (overrides WEBDRIVER_URL)"),
                )
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory for reports and artifacts")
                        .default_value("test-results"),
                ),
        )
        .subcommand(
            command!("list")
                .about("List the tests that would run, per project")
                .arg(
                    arg!([FILTER] ...)
                        .required(false)
                        .help("Only list tests whose title contains one of these strings"),
                )
                .arg(
                    arg!(-p --"project" <NAME>)
                        .required(false)
                        .help("Browser/device project to list (repeatable; default: all)")
                        .action(clap::ArgAction::Append),
                ),
        )
        .subcommand(
            command!("crawl")
                .about("Crawl the links of a single page and report their status")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to crawl")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-l --"limit" <COUNT>)
                        .required(false)
                        .help("Maximum number of links to visit")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(--"external" <POLICY>)
                        .required(false)
                        .help("What to do with links to other origins")
                        .value_parser(["skip", "check"])
                        .default_value("skip"),
                ),
        )
        .subcommand(command!("projects").about("List the browser/device matrix"))
}
