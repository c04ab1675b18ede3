use anyhow::{bail, Context};
use colored::Colorize;
use tracing::info;

use nsrep_server::{NsrepServer, ServerConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Config(args) => cmd_config(&config, args),
    }
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.no_secondary {
        config.secondary = false;
    }
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let server = NsrepServer::open(config).await?;
        info!(
            search = server.repository().search_store().is_some(),
            history = server.repository().has_history(),
            "repository open"
        );
        println!(
            "{} nsrep listening on {}",
            "✓".green().bold(),
            server.config().bind_addr.to_string().bold()
        );
        server.serve().await?;
        Ok(())
    })
}

fn cmd_config(config: &ServerConfig, args: ConfigArgs) -> anyhow::Result<()> {
    let text = config.to_toml()?;
    let Some(key) = args.key else {
        print!("{text}");
        return Ok(());
    };
    let table: toml::Table = toml::from_str(&text)?;
    match table.get(&key) {
        Some(value) => println!("{} = {}", key.cyan(), value),
        None => bail!("unknown configuration key {}", key.yellow()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_keys() {
        let config = ServerConfig::default();
        let key = |k: &str| ConfigArgs { key: Some(k.into()) };
        assert!(cmd_config(&config, key("history_limit")).is_ok());
        assert!(cmd_config(&config, ConfigArgs { key: None }).is_ok());
        let err = cmd_config(&config, key("colour")).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }
}
