use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greeter_bot::config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "greeter-bot")]
#[command(about = "Telegram bot that greets /start and politely ignores everything else")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file; defaults to ./config.toml when present
    #[arg(short, long, env = "GREETER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,greeter_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration; a missing token aborts here, before anything listens
    let config_path = cli.config.as_deref();
    let config = Config::load(config_path).with_context(|| {
        format!(
            "Failed to load config from {}",
            config_path.map_or(DEFAULT_CONFIG_PATH.into(), |p| p.display().to_string())
        )
    })?;

    info!("Configuration loaded successfully");
    info!("  Mode: {}", config.mode);
    info!("  API: {}", config.telegram.effective_api_url());
    info!(
        "  Listen: {}:{}{}",
        config.server.host, config.server.port, config.server.webhook_path
    );

    info!("Bot is starting...");
    greeter_bot::run(config).await?;

    Ok(())
}
