// Core modules
pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod indicators;
pub mod llm;
pub mod market;
pub mod models;
pub mod report;

// Re-export commonly used types
pub use account::AccountClient;
pub use api::{ExchangeAdapter, ExchangeError, HyperliquidClient};
pub use crate::config::AppConfig;
pub use market::{fetch_all_market_data, MarketDataClient};
pub use models::*;

// Error handling
pub use error::{Error, Result};
