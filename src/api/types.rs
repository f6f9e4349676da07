use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Free balance per currency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Balance {
    pub free: HashMap<String, f64>,
}

impl Balance {
    pub fn free_in(&self, currency: &str) -> Option<f64> {
        self.free.get(currency).copied()
    }
}

/// Position as reported by the venue, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPosition {
    pub symbol: String,
    /// Signed size: positive = long, negative = short
    pub size: Option<f64>,
    pub entry_price: Option<f64>,
    pub mark_price: Option<f64>,
    pub liquidation_price: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    pub leverage: Option<f64>,
    pub notional: Option<f64>,
    /// Venue-specific position data, decoded at the adapter boundary
    pub info: Option<VenuePositionInfo>,
    /// Exit plan and metadata attached to the position, if any
    pub annotations: Option<PositionAnnotations>,
}

/// Venue-side position fields used as fallbacks
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenuePositionInfo {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub position_value: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub szi: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub liquidation_px: Option<f64>,
}

impl VenuePositionInfo {
    /// `positionValue / |szi|`, when both are usable
    pub fn implied_price(&self) -> Option<f64> {
        let value = self.position_value?;
        let size = self.szi?;
        if size == 0.0 || !size.is_finite() || !value.is_finite() {
            return None;
        }
        Some(value / size.abs())
    }
}

/// Exit plan and LLM-assigned metadata attached to a position
///
/// Every field is optional so an absent value stays distinguishable from zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PositionAnnotations {
    #[serde(default, deserialize_with = "flexible_i64")]
    pub sl_oid: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub tp_oid: Option<i64>,
    #[serde(default, deserialize_with = "flexible_i64")]
    pub entry_oid: Option<i64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub risk_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub exit_plan: Option<ExitPlanAnnotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExitPlanAnnotation {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub profit_target: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub stop_loss: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub invalidation_condition: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Open order as reported by the venue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOrder {
    pub id: Option<String>,
    pub side: Option<OrderSide>,
    pub is_trigger: Option<bool>,
    /// Venue order-type label, e.g. "Stop Market" or "Take Profit Limit"
    pub order_type: Option<String>,
    pub stop_price: Option<f64>,
    pub trigger_price: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Decode a number or a numeric string; anything unparsable becomes `None`
pub fn flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => n.as_f64(),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        Some(NumberOrString::Other(_)) | None => None,
    })
}

/// Decode an integer id given as a number or a numeric string
pub fn flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        Some(NumberOrString::Other(_)) | None => None,
    })
}

/// Decode `T`, treating a value of the wrong shape as absent
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
