use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use docdesk::commands::{self, Command};
use docdesk::config::AppConfig;
use docdesk::server;

#[derive(Parser, Debug)]
#[command(name = "docdesk", version, about = "Serve, search and import a documentation tree")]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run(cli.config).await,
        Command::Import(args) => commands::import(&cli.config, args).await,
        Command::Search { query } => commands::search(&cli.config, &query).await,
        Command::Tree => commands::print_tree(&cli.config).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
