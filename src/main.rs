mod config;
mod error;
mod filter;
mod hooks;
mod llm;
mod platform;
mod responder;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::llm::LlmClient;
use crate::platform::discord::DiscordChannel;
use crate::responder::ChatResponder;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shadowchat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Secrets usually live in .env
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    // Load configuration
    let explicit_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &explicit_path {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    }
    let config_path = explicit_path.unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Provider: {}", config.llm.provider);
    info!("  Model: {}", config.llm.model);
    info!("  Channel: {}", config.discord.channel_id);
    info!("  Ignored users: {}", config.discord.ignore_user_ids.len());

    let channel = DiscordChannel::new(&config.discord);
    let llm = LlmClient::new(config.llm.clone());
    let mut responder = ChatResponder::new(channel, llm, &config);

    responder.run().await;

    Ok(())
}
