use crate::api::hyperliquid::HYPERLIQUID_API_BASE;
use crate::error::{Error, Result};
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_SYMBOLS: [&str; 6] = [
    "BTC/USDC:USDC",
    "DOGE/USDC:USDC",
    "ETH/USDC:USDC",
    "XRP/USDC:USDC",
    "BNB/USDC:USDC",
    "SOL/USDC:USDC",
];

/// File looked up in the working directory when no `--config` is given
const DEFAULT_CONFIG_FILE: &str = "ashvattha";

/// Runtime settings: optional TOML file, then environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub deepseek_api_key: Option<String>,

    #[serde(default = "default_hyperliquid_url")]
    pub hyperliquid_url: String,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    #[serde(default = "default_deepseek_url")]
    pub deepseek_url: String,
    #[serde(default = "default_deepseek_model")]
    pub deepseek_model: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
}

fn default_hyperliquid_url() -> String {
    HYPERLIQUID_API_BASE.to_string()
}

fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

fn default_quote_currency() -> String {
    "USDC".to_string()
}

fn default_max_concurrent_fetches() -> usize {
    3
}

fn default_deepseek_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_deepseek_model() -> String {
    "deepseek-reasoner".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    300
}

impl AppConfig {
    /// Load settings from `path` (or `./ashvattha.toml` if present) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("symbols"),
        );

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject missing credentials and empty symbol lists
    pub fn validate(&self) -> Result<()> {
        let credentials = [
            ("API_KEY", &self.api_key),
            ("SECRET", &self.secret),
            ("WALLET_ADDRESS", &self.wallet_address),
            ("PRIVATE_KEY", &self.private_key),
        ];

        for (name, value) in credentials {
            if value.trim().is_empty() {
                return Err(missing(name));
            }
        }

        if self.symbols.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "at least one symbol is required".to_string(),
            )));
        }

        Ok(())
    }

    /// DeepSeek key, required only when the LLM is queried
    pub fn deepseek_api_key(&self) -> Result<&str> {
        match self.deepseek_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(missing("DEEPSEEK_API_KEY")),
        }
    }
}

fn missing(name: &str) -> Error {
    Error::Config(ConfigError::Message(format!("{} must be set", name)))
}
