//! Webhook administration for the greeter bot.
//!
//! `info` prints what Telegram currently has registered, `set` points
//! Telegram at this bot's webhook receiver, `delete` removes it so the bot
//! can run in polling mode.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Url;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greeter_bot::config::{Config, DEFAULT_CONFIG_PATH};
use greeter_bot::telegram::TelegramClient;

#[derive(Parser)]
#[command(name = "greeter-webhook")]
#[command(about = "Inspect, register or remove the bot's Telegram webhook")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file; defaults to ./config.toml when present
    #[arg(short, long, env = "GREETER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current webhook registration.
    Info,

    /// Register the webhook. A bare origin such as https://bot.example.com
    /// gets the configured webhook path appended.
    Set {
        url: String,

        /// Discard updates queued while no webhook was reachable.
        #[arg(long)]
        drop_pending: bool,
    },

    /// Remove the webhook.
    Delete {
        /// Discard updates queued on Telegram's side.
        #[arg(long)]
        drop_pending: bool,
    },
}

/// Append `webhook_path` when `url` has no path of its own.
fn resolve_webhook_url(url: &str, webhook_path: &str) -> Result<Url> {
    let mut parsed = Url::parse(url).with_context(|| format!("Invalid webhook URL: {url}"))?;
    if parsed.scheme() != "https" {
        anyhow::bail!("Telegram only delivers webhooks over HTTPS: {url}");
    }
    if parsed.path() == "/" || parsed.path().is_empty() {
        parsed.set_path(webhook_path);
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,greeter_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let config = Config::load(config_path).with_context(|| {
        format!(
            "Failed to load config from {}",
            config_path.map_or(DEFAULT_CONFIG_PATH.into(), |p| p.display().to_string())
        )
    })?;
    let client = TelegramClient::new(&config.telegram)?;

    match cli.command {
        Command::Info => {
            let info = client
                .get_webhook_info()
                .await
                .context("getWebhookInfo failed")?;
            print!("{info}");
        }
        Command::Set { url, drop_pending } => {
            let url = resolve_webhook_url(&url, &config.server.webhook_path)?;
            client
                .set_webhook(url.as_str(), drop_pending)
                .await
                .context("setWebhook failed")?;
            println!("✓  Webhook set to {url}");
        }
        Command::Delete { drop_pending } => {
            client
                .delete_webhook(drop_pending)
                .await
                .context("deleteWebhook failed")?;
            println!("✓  Webhook removed");
        }
    }

    Ok(())
}
