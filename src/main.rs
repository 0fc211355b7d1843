use clap::Parser;
use tally::cli::commands::{Cli, Commands};
use tally::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let project_dir = cli.project_dir.clone();

    match cli.command {
        None => {
            // No subcommand → launch TUI (it logs to a file, not the terminal)
            if let Err(e) = tally::tui::run(project_dir.as_deref(), cli.board.as_deref()) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Init(args)) => {
            init_logging();
            // Init is handled before config discovery
            let dir = project_dir.as_deref().map(std::path::Path::new);
            if let Err(e) = handlers::cmd_init(args, dir) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            init_logging();
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// CLI diagnostics go to stderr, filtered by TALLY_LOG (default warn)
fn init_logging() {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
