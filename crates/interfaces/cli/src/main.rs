use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dom5_config::{AppConfig, DEFAULT_CONFIG_PATH};
use dom5_discord::DiscordClient;
use dom5_runtime::{DispatchSettings, Dispatcher};

#[derive(Debug, Parser)]
#[command(
    name = "dom5-notify",
    version,
    about = "Announce new Dominions 5 turns in a Discord channel"
)]
struct Cli {
    /// The scores.html file written by a Dominions 5 server started with
    /// `--statuspage`.
    #[arg(long, env = "DOM5_SCORES_FILE", value_name = "PATH")]
    scores_file: PathBuf,

    /// A valid Discord bot token.
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    discord_token: String,

    /// The channel to announce turns in, given as its numeric ID.
    #[arg(long, env = "DISCORD_CHANNEL", value_name = "ID")]
    discord_channel: u64,
}

impl Cli {
    fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            bail!("DISCORD_BOT_TOKEN is empty");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    cli.validate()?;

    let config = AppConfig::load_from(DEFAULT_CONFIG_PATH)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = DiscordClient::new(&config.discord).context("building discord client")?;
    let settings = DispatchSettings::new(
        cli.scores_file,
        cli.discord_token.trim(),
        cli.discord_channel,
        &config,
    );
    info!(
        channel = settings.channel_id,
        history_window = settings.history_window,
        "starting turn announcer"
    );

    Dispatcher::new(client, settings)
        .run(shutdown_signal())
        .await
        .context("turn announcer stopped")?;
    Ok(())
}

/// Resolves on SIGINT/SIGTERM (Ctrl-C elsewhere).  If the handlers cannot be
/// installed the announcer keeps running until an error stops it.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
        Ok::<(), std::io::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = async {
        tokio::signal::ctrl_c().await?;
        Ok::<(), std::io::Error>(())
    };

    if let Err(err) = terminate.await {
        tracing::warn!(error = %err, "cannot listen for shutdown signals");
        std::future::pending::<()>().await;
    }
}
