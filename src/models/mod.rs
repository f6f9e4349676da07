use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel order id meaning "no linked order"
pub const NO_ORDER: i64 = -1;

/// OHLCV candlestick data, ordered oldest -> latest by the adapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Column views over a candle window
#[derive(Debug, Clone, Default)]
pub struct CandleColumns {
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl CandleColumns {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut columns = Self {
            closes: Vec::with_capacity(candles.len()),
            highs: Vec::with_capacity(candles.len()),
            lows: Vec::with_capacity(candles.len()),
            volumes: Vec::with_capacity(candles.len()),
        };

        for candle in candles {
            columns.closes.push(candle.close);
            columns.highs.push(candle.high);
            columns.lows.push(candle.low);
            columns.volumes.push(candle.volume);
        }

        columns
    }
}

/// Point-in-time indicator view of one symbol across the 1m and 4h timeframes
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MarketSnapshot {
    pub symbol: String,

    // 1m timeframe
    pub closes_1m: Vec<f64>,
    pub ema20_1m: Vec<f64>,
    pub macd_hist_1m: Vec<f64>,
    pub rsi7_1m: Vec<f64>,
    pub rsi14_1m: Vec<f64>,
    pub current_price: f64,
    pub current_ema20: f64,
    pub current_macd: f64,
    pub current_rsi7: f64,
    pub current_rsi14: f64,

    // 4h timeframe
    pub closes_4h: Vec<f64>,
    pub highs_4h: Vec<f64>,
    pub lows_4h: Vec<f64>,
    pub volumes_4h: Vec<f64>,
    pub ema20_4h: Vec<f64>,
    pub ema50_4h: Vec<f64>,
    pub atr3_4h: Vec<f64>,
    pub atr14_4h: Vec<f64>,
    pub macd_hist_4h: Vec<f64>,
    pub rsi14_4h: Vec<f64>,
    pub current_ema20_4h: f64,
    pub current_ema50_4h: f64,
    pub current_atr3: f64,
    pub current_atr14: f64,
    pub current_macd_4h: f64,
    pub current_rsi14_4h: f64,
    pub current_volume: f64,
    pub avg_volume: f64,

    // Perp market metrics (0.0 when the venue could not provide them)
    pub open_interest: f64,
    pub funding_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExitPlan {
    pub profit_target: f64,
    pub stop_loss: f64,
    pub invalidation_condition: String,
}

/// Normalized open position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64, // positive = long, negative = short
    pub entry_price: f64,
    pub current_price: f64,
    pub liquidation_price: f64,
    pub unrealized_pnl: f64,
    pub leverage: f64,
    pub exit_plan: ExitPlan,
    pub confidence: f64,
    pub risk_usd: f64,
    pub sl_oid: i64,
    pub tp_oid: i64,
    pub wait_for_fill: bool,
    pub entry_oid: i64,
    pub notional_usd: f64,
}

impl Position {
    /// Empty position for a symbol: zero numerics, unlinked orders
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0.0,
            entry_price: 0.0,
            current_price: 0.0,
            liquidation_price: 0.0,
            unrealized_pnl: 0.0,
            leverage: 0.0,
            exit_plan: ExitPlan::default(),
            confidence: 0.0,
            risk_usd: 0.0,
            sl_oid: NO_ORDER,
            tp_oid: NO_ORDER,
            wait_for_fill: false,
            entry_oid: NO_ORDER,
            notional_usd: 0.0,
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }
}

/// Account state and open positions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    /// Always 0.0: no initial account value is tracked
    pub total_return_percent: f64,
    pub available_cash: f64,
    pub current_account_value: f64,
    pub positions: Vec<Position>,
    /// Always 0.0: no return history is tracked
    pub sharpe_ratio: f64,
}

impl AccountSnapshot {
    /// Build a snapshot; account value = cash + sum of notionals
    pub fn new(available_cash: f64, positions: Vec<Position>) -> Self {
        let total_notional: f64 = positions.iter().map(|p| p.notional_usd).sum();

        Self {
            total_return_percent: 0.0,
            available_cash,
            current_account_value: available_cash + total_notional,
            positions,
            sharpe_ratio: 0.0,
        }
    }
}

/// Base asset of a unified symbol: "BTC/USDC:USDC" -> "BTC"
pub fn base_asset(symbol: &str) -> &str {
    symbol.split(['/', ':']).next().unwrap_or(symbol)
}
