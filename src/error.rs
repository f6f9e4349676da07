use crate::api::ExchangeError;
use crate::indicators::IndicatorError;
use crate::llm::LlmError;
use thiserror::Error;

/// Failures that abort a snapshot build or the advisor pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("error fetching balance: {0}")]
    Balance(#[source] ExchangeError),

    #[error("error fetching positions: {0}")]
    Positions(#[source] ExchangeError),

    #[error("error fetching {timeframe} data for {symbol}: {source}")]
    Candles {
        symbol: String,
        timeframe: &'static str,
        #[source]
        source: ExchangeError,
    },

    #[error("indicator computation failed for {symbol}: {source}")]
    Indicator {
        symbol: String,
        #[source]
        source: IndicatorError,
    },

    #[error("exchange client error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
