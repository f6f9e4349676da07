pub mod hyperliquid;
pub mod types;

pub use hyperliquid::HyperliquidClient;
pub use types::{
    Balance, ExitPlanAnnotation, OrderSide, PositionAnnotations, RawOrder, RawPosition,
    VenuePositionInfo,
};

use crate::models::Candle;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{what} not found for {symbol}")]
    NotFound { what: &'static str, symbol: String },

    #[error("unsupported timeframe: {0}")]
    UnsupportedTimeframe(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Exchange operations consumed by the snapshot builders
///
/// Each call stands alone: no retries, no caching. Callers decide which
/// failures are fatal.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Free balance per currency
    async fn fetch_balance(&self) -> Result<Balance, ExchangeError>;

    async fn fetch_positions(&self) -> Result<Vec<RawPosition>, ExchangeError>;

    async fn fetch_open_orders(&self, symbol: &str) -> Result<Vec<RawOrder>, ExchangeError>;

    /// Up to `limit` candles, oldest -> latest
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError>;

    /// Last traded price
    async fn fetch_ticker_price(&self, symbol: &str) -> Result<f64, ExchangeError>;

    async fn fetch_open_interest(&self, symbol: &str) -> Result<f64, ExchangeError>;

    async fn fetch_funding_rate(&self, symbol: &str) -> Result<f64, ExchangeError>;
}
