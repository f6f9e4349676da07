#![allow(dead_code)]

use ashvattha::api::{Balance, ExchangeAdapter, ExchangeError, RawOrder, RawPosition};
use ashvattha::models::Candle;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory exchange with canned responses and switchable failures
#[derive(Default)]
pub struct StubExchange {
    pub balance: HashMap<String, f64>,
    pub fail_balance: bool,
    pub positions: Vec<RawPosition>,
    pub fail_positions: bool,
    pub orders: HashMap<String, Vec<RawOrder>>,
    pub fail_orders: bool,
    pub candles: HashMap<(String, String), Vec<Candle>>,
    pub failing_candles: HashSet<String>,
    pub tickers: HashMap<String, f64>,
    pub open_interest: Option<f64>,
    pub funding_rate: Option<f64>,
    pub ticker_calls: AtomicUsize,
}

fn stub_error(what: &str) -> ExchangeError {
    ExchangeError::InvalidResponse(format!("stub {} unavailable", what))
}

impl StubExchange {
    pub fn with_cash(mut self, usdc: f64) -> Self {
        self.balance.insert("USDC".to_string(), usdc);
        self
    }

    /// Register 1m and 4h candle histories for a symbol
    pub fn with_market(mut self, symbol: &str, base_price: f64, minutes: usize, bars_4h: usize) -> Self {
        self.candles.insert(
            (symbol.to_string(), "1m".to_string()),
            candle_series(base_price, minutes, Duration::minutes(1)),
        );
        self.candles.insert(
            (symbol.to_string(), "4h".to_string()),
            candle_series(base_price, bars_4h, Duration::hours(4)),
        );
        self
    }

    pub fn ticker_calls(&self) -> usize {
        self.ticker_calls.load(Ordering::SeqCst)
    }
}

/// Gently trending wave around `base_price`
pub fn candle_series(base_price: f64, count: usize, step: Duration) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = base_price * (1.0 + 0.0005 * x + 0.01 * (x / 5.0).sin());
            let open = close * (1.0 - 0.001 * (x / 3.0).cos());
            Candle {
                timestamp: start + step * i as i32,
                open,
                high: close.max(open) * 1.002,
                low: close.min(open) * 0.998,
                close,
                volume: 1000.0 + 50.0 * (x / 7.0).sin().abs() * x,
            }
        })
        .collect()
}

#[async_trait]
impl ExchangeAdapter for StubExchange {
    async fn fetch_balance(&self) -> Result<Balance, ExchangeError> {
        if self.fail_balance {
            return Err(stub_error("balance"));
        }
        Ok(Balance {
            free: self.balance.clone(),
        })
    }

    async fn fetch_positions(&self) -> Result<Vec<RawPosition>, ExchangeError> {
        if self.fail_positions {
            return Err(stub_error("positions"));
        }
        Ok(self.positions.clone())
    }

    async fn fetch_open_orders(&self, symbol: &str) -> Result<Vec<RawOrder>, ExchangeError> {
        if self.fail_orders {
            return Err(stub_error("orders"));
        }
        Ok(self.orders.get(symbol).cloned().unwrap_or_default())
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        if self.failing_candles.contains(symbol) {
            return Err(stub_error("candles"));
        }
        let candles = self
            .candles
            .get(&(symbol.to_string(), timeframe.to_string()))
            .cloned()
            .unwrap_or_default();
        let skip = candles.len().saturating_sub(limit);
        Ok(candles.into_iter().skip(skip).collect())
    }

    async fn fetch_ticker_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        self.tickers
            .get(symbol)
            .copied()
            .ok_or_else(|| stub_error("ticker"))
    }

    async fn fetch_open_interest(&self, _symbol: &str) -> Result<f64, ExchangeError> {
        self.open_interest.ok_or_else(|| stub_error("open interest"))
    }

    async fn fetch_funding_rate(&self, _symbol: &str) -> Result<f64, ExchangeError> {
        self.funding_rate.ok_or_else(|| stub_error("funding rate"))
    }
}
