use docsmoke::commands::command_argument_builder;
use docsmoke::handlers::{handle_crawl, handle_list, handle_projects, handle_run, init_tracing};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(quiet);

    let outcome = match chosen_command.subcommand() {
        Some(("run", primary_command)) => handle_run(primary_command, quiet).await,
        Some(("list", primary_command)) => handle_list(primary_command).map(|_| true),
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        Some(("projects", _)) => {
            handle_projects();
            Ok(true)
        }
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    }
}
