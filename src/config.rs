use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub ai: AiConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_store_config")]
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Chat id allowed to use /broadcast.
    pub admin_chat_id: i64,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    pub api_key: String,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_summarize_model")]
    pub summarize_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    #[serde(default = "default_bin_base_url")]
    pub bin_base_url: String,
    #[serde(default = "default_random_user_url")]
    pub random_user_url: String,
    /// Placeholder third-party contract; override with a real resolver.
    #[serde(default = "default_yt_resolver_url")]
    pub yt_resolver_url: String,
    #[serde(default = "default_ip_info_base_url")]
    pub ip_info_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Upper bound on every outbound call so a hung upstream can't pin the
    /// handling task forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_ai_base_url() -> String {
    "https://api.cloudflare.com/workers-ai".to_string()
}

fn default_summarize_model() -> String {
    "@cf/facebook/bart-large-cnn".to_string()
}

fn default_bin_base_url() -> String {
    "https://lookup.binlist.net".to_string()
}

fn default_random_user_url() -> String {
    "https://randomuser.me/api/".to_string()
}

fn default_yt_resolver_url() -> String {
    // No real contract behind this endpoint; see the lookup module.
    "https://some-youtube-download-api.com/download".to_string()
}

fn default_ip_info_base_url() -> String {
    "https://ipinfo.io".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("toolbot.db")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_store_config() -> StoreConfig {
    StoreConfig {
        database_path: default_db_path(),
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig {
            bin_base_url: default_bin_base_url(),
            random_user_url: default_random_user_url(),
            yt_resolver_url: default_yt_resolver_url(),
            ip_info_base_url: default_ip_info_base_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}
