use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = cli::Cli::parse();
    commands::run_command(cli)
}
