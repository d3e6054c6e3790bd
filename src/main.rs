mod ai;
mod broadcast;
mod config;
mod dispatch;
mod lookup;
mod server;
mod store;
mod telegram;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::AiClient;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::lookup::LookupClient;
use crate::store::ChatStore;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,toolbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  AI provider: {}", config.ai.base_url);
    info!("  Chat store: {}", config.store.database_path.display());
    info!("  Admin chat: {}", config.telegram.admin_chat_id);

    let store = ChatStore::open(&config.store.database_path)?;

    // One shared client; the timeout bounds every outbound call.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let notifier = Arc::new(TelegramClient::new(
        http.clone(),
        config.telegram.api_base.clone(),
        config.telegram.bot_token.clone(),
    ));
    let ai = AiClient::new(http.clone(), config.ai.clone());
    let lookup = LookupClient::new(http, config.lookup.clone());

    let dispatcher = Arc::new(Dispatcher::new(
        ai,
        lookup,
        store,
        notifier,
        config.telegram.admin_chat_id,
    ));

    info!("Bot is starting...");
    server::run(&config.server.bind, dispatcher).await?;

    Ok(())
}
