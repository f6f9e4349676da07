// Market snapshot builder: candles -> indicators -> MarketSnapshot

use crate::api::ExchangeAdapter;
use crate::error::{Error, Result};
use crate::indicators::{
    calculate_atr, calculate_ema, calculate_rsi, calculate_sma, current,
    macd::macd_histogram, IndicatorError,
};
use crate::models::{CandleColumns, MarketSnapshot};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const INTRADAY_TIMEFRAME: &str = "1m";
pub const INTRADAY_CANDLES: usize = 1000;
pub const CONTEXT_TIMEFRAME: &str = "4h";
pub const CONTEXT_CANDLES: usize = 100;
const AVG_VOLUME_PERIOD: usize = 20;

/// Builds market snapshots from an exchange adapter
#[derive(Clone)]
pub struct MarketDataClient {
    exchange: Arc<dyn ExchangeAdapter>,
}

/// Indicators over the 1m window
struct IntradaySeries {
    ema20: Vec<f64>,
    macd_hist: Vec<f64>,
    rsi7: Vec<f64>,
    rsi14: Vec<f64>,
}

/// Indicators over the 4h window
struct ContextSeries {
    ema20: Vec<f64>,
    ema50: Vec<f64>,
    atr3: Vec<f64>,
    atr14: Vec<f64>,
    macd_hist: Vec<f64>,
    rsi14: Vec<f64>,
    avg_volume: Vec<f64>,
}

fn intraday_series(closes: &[f64]) -> std::result::Result<IntradaySeries, IndicatorError> {
    Ok(IntradaySeries {
        ema20: calculate_ema(closes, 20)?,
        macd_hist: macd_histogram(closes)?,
        rsi7: calculate_rsi(closes, 7)?,
        rsi14: calculate_rsi(closes, 14)?,
    })
}

fn context_series(columns: &CandleColumns) -> std::result::Result<ContextSeries, IndicatorError> {
    let CandleColumns {
        closes,
        highs,
        lows,
        volumes,
    } = columns;

    Ok(ContextSeries {
        ema20: calculate_ema(closes, 20)?,
        ema50: calculate_ema(closes, 50)?,
        atr3: calculate_atr(highs, lows, closes, 3)?,
        atr14: calculate_atr(highs, lows, closes, 14)?,
        macd_hist: macd_histogram(closes)?,
        rsi14: calculate_rsi(closes, 14)?,
        avg_volume: calculate_sma(volumes, AVG_VOLUME_PERIOD)?,
    })
}

impl MarketDataClient {
    pub fn new(exchange: Arc<dyn ExchangeAdapter>) -> Self {
        Self { exchange }
    }

    /// Fetch candles for both timeframes and compute every indicator
    ///
    /// Candle and indicator failures are fatal. Open interest and funding rate
    /// are best effort and fall back to 0.0.
    pub async fn get_market_data(&self, symbol: &str) -> Result<MarketSnapshot> {
        let intraday = self
            .fetch_columns(symbol, INTRADAY_TIMEFRAME, INTRADAY_CANDLES)
            .await?;
        let indicator_err = |source| Error::Indicator {
            symbol: symbol.to_string(),
            source,
        };

        let series_1m = intraday_series(&intraday.closes).map_err(indicator_err)?;
        let current_price = current("close", &intraday.closes).map_err(indicator_err)?;
        let current_ema20 = current("ema", &series_1m.ema20).map_err(indicator_err)?;
        let current_macd = current("macd", &series_1m.macd_hist).map_err(indicator_err)?;
        let current_rsi7 = current("rsi", &series_1m.rsi7).map_err(indicator_err)?;
        let current_rsi14 = current("rsi", &series_1m.rsi14).map_err(indicator_err)?;

        let context = self
            .fetch_columns(symbol, CONTEXT_TIMEFRAME, CONTEXT_CANDLES)
            .await?;
        let series_4h = context_series(&context).map_err(indicator_err)?;

        let current_ema20_4h = current("ema", &series_4h.ema20).map_err(indicator_err)?;
        let current_ema50_4h = current("ema", &series_4h.ema50).map_err(indicator_err)?;
        let current_atr3 = current("atr", &series_4h.atr3).map_err(indicator_err)?;
        let current_atr14 = current("atr", &series_4h.atr14).map_err(indicator_err)?;
        let current_macd_4h = current("macd", &series_4h.macd_hist).map_err(indicator_err)?;
        let current_rsi14_4h = current("rsi", &series_4h.rsi14).map_err(indicator_err)?;
        let current_volume = current("volume", &context.volumes).map_err(indicator_err)?;
        let avg_volume = current("sma", &series_4h.avg_volume).map_err(indicator_err)?;

        let open_interest = self.open_interest_or_zero(symbol).await;
        let funding_rate = self.funding_rate_or_zero(symbol).await;

        tracing::info!(
            symbol,
            price = current_price,
            rsi7 = current_rsi7,
            "Built market snapshot"
        );

        Ok(MarketSnapshot {
            symbol: symbol.to_string(),
            closes_1m: intraday.closes,
            ema20_1m: series_1m.ema20,
            macd_hist_1m: series_1m.macd_hist,
            rsi7_1m: series_1m.rsi7,
            rsi14_1m: series_1m.rsi14,
            current_price,
            current_ema20,
            current_macd,
            current_rsi7,
            current_rsi14,
            closes_4h: context.closes,
            highs_4h: context.highs,
            lows_4h: context.lows,
            volumes_4h: context.volumes,
            ema20_4h: series_4h.ema20,
            ema50_4h: series_4h.ema50,
            atr3_4h: series_4h.atr3,
            atr14_4h: series_4h.atr14,
            macd_hist_4h: series_4h.macd_hist,
            rsi14_4h: series_4h.rsi14,
            current_ema20_4h,
            current_ema50_4h,
            current_atr3,
            current_atr14,
            current_macd_4h,
            current_rsi14_4h,
            current_volume,
            avg_volume,
            open_interest,
            funding_rate,
        })
    }

    async fn fetch_columns(
        &self,
        symbol: &str,
        timeframe: &'static str,
        limit: usize,
    ) -> Result<CandleColumns> {
        let candles = self
            .exchange
            .fetch_ohlcv(symbol, timeframe, limit)
            .await
            .map_err(|source| Error::Candles {
                symbol: symbol.to_string(),
                timeframe,
                source,
            })?;

        if candles.is_empty() {
            return Err(Error::Indicator {
                symbol: symbol.to_string(),
                source: IndicatorError::InsufficientData {
                    indicator: "candles",
                    required: 1,
                    actual: 0,
                },
            });
        }

        Ok(CandleColumns::from_candles(&candles))
    }

    async fn open_interest_or_zero(&self, symbol: &str) -> f64 {
        match self.exchange.fetch_open_interest(symbol).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(symbol, "Open interest not available: {}", e);
                0.0
            }
        }
    }

    async fn funding_rate_or_zero(&self, symbol: &str) -> f64 {
        match self.exchange.fetch_funding_rate(symbol).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(symbol, "Funding rate not available: {}", e);
                0.0
            }
        }
    }
}

/// Build snapshots for several symbols with at most `max_concurrent` in flight
///
/// Results come back in the order of `symbols`. The first failure aborts the batch.
pub async fn fetch_all_market_data(
    client: &MarketDataClient,
    symbols: &[String],
    max_concurrent: usize,
) -> Result<Vec<MarketSnapshot>> {
    let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks = JoinSet::new();

    for (index, symbol) in symbols.iter().enumerate() {
        let client = client.clone();
        let symbol = symbol.clone();
        let permits = permits.clone();

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (index, client.get_market_data(&symbol).await)
        });
    }

    let mut slots: Vec<Option<MarketSnapshot>> = vec![None; symbols.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        slots[index] = Some(result?);
    }

    Ok(slots.into_iter().flatten().collect())
}
