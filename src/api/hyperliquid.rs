use super::types::{flexible_f64, flexible_i64, lenient};
use super::{
    Balance, ExchangeAdapter, ExchangeError, OrderSide, PositionAnnotations, RawOrder,
    RawPosition, VenuePositionInfo,
};
use crate::models::{base_asset, Candle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub const HYPERLIQUID_API_BASE: &str = "https://api.hyperliquid.xyz";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_PER_SECOND: NonZeroU32 = match NonZeroU32::new(20) {
    Some(n) => n,
    None => panic!("rate limit must be non-zero"),
};
/// Perps on Hyperliquid settle in USDC
const SETTLEMENT_CURRENCY: &str = "USDC";

type HyperliquidRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Hyperliquid client over the public `/info` endpoint
///
/// Cloneable; clones share the HTTP connection pool and the rate limiter.
#[derive(Clone)]
pub struct HyperliquidClient {
    client: Client,
    base_url: String,
    wallet_address: String,
    rate_limiter: Arc<HyperliquidRateLimiter>,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearinghouseState {
    #[serde(default)]
    asset_positions: Vec<AssetPosition>,
    #[serde(default, deserialize_with = "flexible_f64")]
    withdrawable: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AssetPosition {
    #[serde(default)]
    position: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionData {
    coin: String,
    #[serde(default, deserialize_with = "flexible_f64")]
    szi: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    entry_px: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    position_value: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    unrealized_pnl: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    liquidation_px: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    leverage: Option<LeverageData>,
}

#[derive(Debug, Deserialize)]
struct LeverageData {
    #[serde(default, deserialize_with = "flexible_f64")]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenOrderData {
    coin: String,
    #[serde(default)]
    side: Option<String>,
    #[serde(default, deserialize_with = "flexible_i64")]
    oid: Option<i64>,
    #[serde(default)]
    is_trigger: Option<bool>,
    #[serde(default)]
    order_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    trigger_px: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    stop_px: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CandleData {
    t: i64,
    #[serde(default, deserialize_with = "flexible_f64")]
    o: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    h: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    l: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    c: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    universe: Vec<AssetMeta>,
}

#[derive(Debug, Deserialize)]
struct AssetMeta {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetContext {
    #[serde(default, deserialize_with = "flexible_f64")]
    funding: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    open_interest: Option<f64>,
}

// ============== Conversions ==============

impl TryFrom<CandleData> for Candle {
    type Error = ExchangeError;

    fn try_from(raw: CandleData) -> Result<Self, Self::Error> {
        let timestamp: DateTime<Utc> = DateTime::from_timestamp_millis(raw.t).ok_or_else(|| {
            ExchangeError::InvalidResponse(format!("bad candle timestamp {}", raw.t))
        })?;

        match (raw.o, raw.h, raw.l, raw.c, raw.v) {
            (Some(open), Some(high), Some(low), Some(close), Some(volume)) => Ok(Candle {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            }),
            _ => Err(ExchangeError::InvalidResponse(format!(
                "incomplete candle at {}",
                timestamp
            ))),
        }
    }
}

impl From<OpenOrderData> for RawOrder {
    fn from(raw: OpenOrderData) -> Self {
        let side = match raw.side.as_deref() {
            Some("A") => Some(OrderSide::Sell),
            Some("B") => Some(OrderSide::Buy),
            _ => None,
        };

        RawOrder {
            id: raw.oid.map(|oid| oid.to_string()),
            side,
            is_trigger: raw.is_trigger,
            order_type: raw.order_type,
            stop_price: raw.stop_px,
            trigger_price: raw.trigger_px,
        }
    }
}

/// Decode one `assetPositions[].position` object
///
/// Only an unusable `coin` rejects the position; malformed optional fields read as absent.
fn decode_position(value: serde_json::Value) -> Result<RawPosition, ExchangeError> {
    let data: PositionData = serde_json::from_value(value.clone())?;

    let info = match serde_json::from_value::<VenuePositionInfo>(value.clone()) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::debug!(coin = %data.coin, "Ignoring malformed position info: {}", e);
            None
        }
    };

    let annotations = match serde_json::from_value::<PositionAnnotations>(value) {
        Ok(annotations) => (annotations != PositionAnnotations::default()).then_some(annotations),
        Err(e) => {
            tracing::debug!(coin = %data.coin, "Ignoring malformed position annotations: {}", e);
            None
        }
    };

    Ok(RawPosition {
        symbol: unified_symbol(&data.coin),
        size: data.szi,
        entry_price: data.entry_px,
        // clearinghouseState carries no mark price
        mark_price: None,
        liquidation_price: data.liquidation_px,
        unrealized_pnl: data.unrealized_pnl,
        leverage: data.leverage.and_then(|l| l.value),
        notional: data.position_value,
        info,
        annotations,
    })
}

fn unified_symbol(coin: &str) -> String {
    format!("{}/{}:{}", coin, SETTLEMENT_CURRENCY, SETTLEMENT_CURRENCY)
}

/// Candle interval length in milliseconds ("1m", "4h", "1d", ...)
pub fn timeframe_millis(timeframe: &str) -> Result<i64, ExchangeError> {
    let unsupported = || ExchangeError::UnsupportedTimeframe(timeframe.to_string());

    let split = timeframe
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(unsupported)?;
    let (amount, unit) = timeframe.split_at(split);
    let amount: i64 = amount.parse().map_err(|_| unsupported())?;

    let unit_millis = match unit {
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return Err(unsupported()),
    };

    if amount == 0 {
        return Err(unsupported());
    }
    Ok(amount * unit_millis)
}

// ============== Implementation ==============

impl HyperliquidClient {
    pub fn new(wallet_address: impl Into<String>) -> Result<Self, ExchangeError> {
        Self::with_base_url(HYPERLIQUID_API_BASE, wallet_address)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        wallet_address: impl Into<String>,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            wallet_address: wallet_address.into(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(
                RATE_LIMIT_PER_SECOND,
            ))),
        })
    }

    /// Rate-limited POST to `/info`
    async fn post_info<T: DeserializeOwned>(
        &self,
        body: serde_json::Value,
    ) -> Result<T, ExchangeError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/info", self.base_url);
        tracing::debug!(request = %body, "Hyperliquid info request");

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn clearinghouse_state(&self) -> Result<ClearinghouseState, ExchangeError> {
        self.post_info(json!({
            "type": "clearinghouseState",
            "user": self.wallet_address,
        }))
        .await
    }

    async fn asset_context(&self, symbol: &str) -> Result<AssetContext, ExchangeError> {
        let coin = base_asset(symbol);
        let (meta, contexts): (Meta, Vec<AssetContext>) =
            self.post_info(json!({ "type": "metaAndAssetCtxs" })).await?;

        let index = meta
            .universe
            .iter()
            .position(|asset| asset.name == coin)
            .ok_or_else(|| ExchangeError::NotFound {
                what: "asset context",
                symbol: symbol.to_string(),
            })?;

        contexts
            .into_iter()
            .nth(index)
            .ok_or_else(|| ExchangeError::NotFound {
                what: "asset context",
                symbol: symbol.to_string(),
            })
    }
}

#[async_trait]
impl ExchangeAdapter for HyperliquidClient {
    async fn fetch_balance(&self) -> Result<Balance, ExchangeError> {
        let state = self.clearinghouse_state().await?;

        let mut free = HashMap::new();
        if let Some(withdrawable) = state.withdrawable {
            free.insert(SETTLEMENT_CURRENCY.to_string(), withdrawable);
        }

        Ok(Balance { free })
    }

    async fn fetch_positions(&self) -> Result<Vec<RawPosition>, ExchangeError> {
        let state = self.clearinghouse_state().await?;

        let mut positions = Vec::with_capacity(state.asset_positions.len());
        for asset in state.asset_positions {
            match decode_position(asset.position) {
                Ok(position) => positions.push(position),
                Err(e) => tracing::warn!("Skipping undecodable position: {}", e),
            }
        }

        Ok(positions)
    }

    async fn fetch_open_orders(&self, symbol: &str) -> Result<Vec<RawOrder>, ExchangeError> {
        let coin = base_asset(symbol);
        let orders: Vec<serde_json::Value> = self
            .post_info(json!({
                "type": "frontendOpenOrders",
                "user": self.wallet_address,
            }))
            .await?;

        let mut matching = Vec::new();
        for order in orders {
            match serde_json::from_value::<OpenOrderData>(order) {
                Ok(order) if order.coin == coin => matching.push(order.into()),
                Ok(_) => {}
                Err(e) => tracing::warn!(symbol, "Skipping undecodable order: {}", e),
            }
        }

        Ok(matching)
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let interval = timeframe_millis(timeframe)?;
        let end_time = Utc::now().timestamp_millis();
        let start_time = end_time - interval * limit as i64;

        let raw: Vec<CandleData> = self
            .post_info(json!({
                "type": "candleSnapshot",
                "req": {
                    "coin": base_asset(symbol),
                    "interval": timeframe,
                    "startTime": start_time,
                    "endTime": end_time,
                },
            }))
            .await?;

        let mut candles = raw
            .into_iter()
            .map(Candle::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }

        tracing::debug!(symbol, timeframe, count = candles.len(), "Fetched candles");
        Ok(candles)
    }

    async fn fetch_ticker_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let mids: HashMap<String, String> = self.post_info(json!({ "type": "allMids" })).await?;

        mids.get(base_asset(symbol))
            .and_then(|mid| mid.parse().ok())
            .ok_or_else(|| ExchangeError::NotFound {
                what: "ticker",
                symbol: symbol.to_string(),
            })
    }

    async fn fetch_open_interest(&self, symbol: &str) -> Result<f64, ExchangeError> {
        self.asset_context(symbol)
            .await?
            .open_interest
            .ok_or_else(|| ExchangeError::NotFound {
                what: "open interest",
                symbol: symbol.to_string(),
            })
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> Result<f64, ExchangeError> {
        self.asset_context(symbol)
            .await?
            .funding
            .ok_or_else(|| ExchangeError::NotFound {
                what: "funding rate",
                symbol: symbol.to_string(),
            })
    }
}
