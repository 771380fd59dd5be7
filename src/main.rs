//! quarid - IRC services bot.

use anyhow::Context;
use quarid::config::validate;
use quarid::db::Store;
use quarid::{Bot, Config};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quarid=info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(server = %config.irc.server, nick = %config.irc.nick, "Starting quarid");

    let store = Store::open(&config.database.path)
        .with_context(|| format!("opening store at {}", config.database.path.display()))?;

    let bot = Bot::new(&config, store);
    bot.connect().await?;

    tokio::select! {
        _ = bot.wait() => {
            warn!("Connection closed");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
            bot.disconnect("Shutting down").await;
        }
    }

    Ok(())
}
