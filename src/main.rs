use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use reqsift::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Only show logs with --verbose, unless RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("reqsift=debug")
        } else {
            EnvFilter::new("reqsift=warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse(args) => cli::parse::execute(args, &cli.config),
        Commands::Detect(args) => cli::detect::execute(args, &cli.config),
        Commands::Analyze(args) => cli::analyze::execute(args, &cli.config).await,
        Commands::Prompt(args) => cli::prompt::execute(args, &cli.config),
        Commands::Schema => cli::schema::execute(),
    }
}
