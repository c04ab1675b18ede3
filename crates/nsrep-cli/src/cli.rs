use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nsrep", about = "Namespaced metadata repository", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file; defaults apply when it does not exist.
    #[arg(
        short,
        long,
        global = true,
        env = "NSREP_CONFIG_FILE",
        default_value = "nsrep.toml"
    )]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides `bind_addr` from the configuration file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Run without the search store
    #[arg(long)]
    pub no_secondary: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print a single key
    pub key: Option<String>,
}
