// Position normalizer: raw venue positions/orders -> AccountSnapshot

use crate::api::{ExchangeAdapter, OrderSide, PositionAnnotations, RawOrder, RawPosition};
use crate::error::{Error, Result};
use crate::models::{AccountSnapshot, Position, NO_ORDER};
use std::sync::Arc;

pub const DEFAULT_QUOTE_CURRENCY: &str = "USDC";

/// Role of a trigger order relative to an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRole {
    StopLoss,
    TakeProfit,
}

/// Builds account snapshots from an exchange adapter
#[derive(Clone)]
pub struct AccountClient {
    exchange: Arc<dyn ExchangeAdapter>,
    quote_currency: String,
}

impl AccountClient {
    pub fn new(exchange: Arc<dyn ExchangeAdapter>) -> Self {
        Self {
            exchange,
            quote_currency: DEFAULT_QUOTE_CURRENCY.to_string(),
        }
    }

    /// Currency whose free balance counts as available cash
    pub fn with_quote_currency(mut self, currency: impl Into<String>) -> Self {
        self.quote_currency = currency.into();
        self
    }

    /// Fetch balance, positions and open orders and normalize them
    ///
    /// Only balance and position fetch failures are fatal.
    pub async fn get_account_info(&self) -> Result<AccountSnapshot> {
        let balance = self
            .exchange
            .fetch_balance()
            .await
            .map_err(Error::Balance)?;
        let available_cash = balance.free_in(&self.quote_currency).unwrap_or(0.0);

        let raw_positions = self
            .exchange
            .fetch_positions()
            .await
            .map_err(Error::Positions)?;

        let mut positions = Vec::with_capacity(raw_positions.len());
        for raw in raw_positions {
            positions.push(self.normalize_position(raw).await);
        }

        let account = AccountSnapshot::new(available_cash, positions);
        tracing::info!(
            cash = account.available_cash,
            value = account.current_account_value,
            positions = account.positions.len(),
            "Built account snapshot"
        );

        Ok(account)
    }

    async fn normalize_position(&self, raw: RawPosition) -> Position {
        let mut position = Position::new(raw.symbol.clone());
        position.quantity = raw.size.unwrap_or(0.0);
        position.entry_price = raw.entry_price.unwrap_or(0.0);
        position.current_price = self.resolve_current_price(&raw).await;
        position.liquidation_price = resolve_liquidation_price(&raw);
        position.unrealized_pnl = raw.unrealized_pnl.unwrap_or(0.0);
        position.leverage = raw.leverage.unwrap_or(0.0);
        position.notional_usd = raw
            .notional
            .unwrap_or_else(|| position.quantity.abs() * position.current_price);

        if let Some(annotations) = &raw.annotations {
            apply_annotations(&mut position, annotations);
        }

        match self.exchange.fetch_open_orders(&raw.symbol).await {
            Ok(orders) => reconcile_orders(&mut position, &orders),
            Err(e) => tracing::warn!(
                symbol = %raw.symbol,
                "Could not fetch open orders, keeping exit plan as-is: {}",
                e
            ),
        }

        position
    }

    /// Mark price -> positionValue / |szi| -> ticker last price
    async fn resolve_current_price(&self, raw: &RawPosition) -> f64 {
        if let Some(price) = raw.mark_price.filter(|p| usable_price(*p)) {
            return price;
        }

        if let Some(price) = raw
            .info
            .as_ref()
            .and_then(|info| info.implied_price())
            .filter(|p| usable_price(*p))
        {
            tracing::debug!(symbol = %raw.symbol, price, "Current price from position value");
            return price;
        }

        match self.exchange.fetch_ticker_price(&raw.symbol).await {
            Ok(price) if usable_price(price) => price,
            Ok(price) => {
                tracing::warn!(symbol = %raw.symbol, price, "Ticker returned unusable price");
                0.0
            }
            Err(e) => {
                tracing::warn!(symbol = %raw.symbol, "Ticker fallback failed: {}", e);
                0.0
            }
        }
    }
}

fn usable_price(price: f64) -> bool {
    price.is_finite() && price != 0.0
}

/// Adapter field, else venue `liquidationPx`, else 0.0
pub fn resolve_liquidation_price(raw: &RawPosition) -> f64 {
    raw.liquidation_price
        .or_else(|| raw.info.as_ref().and_then(|info| info.liquidation_px))
        .unwrap_or(0.0)
}

/// Copy exit plan and metadata onto the position; absent fields keep defaults
pub fn apply_annotations(position: &mut Position, annotations: &PositionAnnotations) {
    position.sl_oid = annotations.sl_oid.unwrap_or(NO_ORDER);
    position.tp_oid = annotations.tp_oid.unwrap_or(NO_ORDER);
    position.entry_oid = annotations.entry_oid.unwrap_or(NO_ORDER);
    position.confidence = annotations.confidence.unwrap_or(0.0);
    position.risk_usd = annotations.risk_usd.unwrap_or(0.0);

    if let Some(plan) = &annotations.exit_plan {
        position.exit_plan.profit_target = plan.profit_target.unwrap_or(0.0);
        position.exit_plan.stop_loss = plan.stop_loss.unwrap_or(0.0);
        position.exit_plan.invalidation_condition =
            plan.invalidation_condition.clone().unwrap_or_default();
    }
}

/// Role implied by an order-type label such as "Stop Market" or "Take Profit Limit"
fn explicit_role(order_type: &str) -> Option<TriggerRole> {
    let normalized = order_type.to_ascii_lowercase().replace(['_', '-'], " ");

    if normalized.starts_with("stop") {
        Some(TriggerRole::StopLoss)
    } else if normalized.starts_with("take profit") {
        Some(TriggerRole::TakeProfit)
    } else {
        None
    }
}

/// Stop-loss vs take-profit from position direction and order side
fn infer_role(
    side: OrderSide,
    quantity: f64,
    entry_price: f64,
    trigger_price: f64,
) -> Option<TriggerRole> {
    if quantity > 0.0 && side == OrderSide::Sell {
        if trigger_price < entry_price {
            Some(TriggerRole::StopLoss)
        } else {
            Some(TriggerRole::TakeProfit)
        }
    } else if quantity < 0.0 && side == OrderSide::Buy {
        if trigger_price > entry_price {
            Some(TriggerRole::StopLoss)
        } else {
            Some(TriggerRole::TakeProfit)
        }
    } else {
        None
    }
}

/// Classify an open order against a position
///
/// Returns the role and trigger price, or `None` when the order is not a
/// usable stop-loss / take-profit for this position.
pub fn classify_order(
    order: &RawOrder,
    quantity: f64,
    entry_price: f64,
) -> Option<(TriggerRole, f64)> {
    let typed_role = order.order_type.as_deref().and_then(explicit_role);
    if !order.is_trigger.unwrap_or(false) && typed_role.is_none() {
        return None;
    }

    let trigger_price = order
        .stop_price
        .filter(|p| *p != 0.0)
        .or(order.trigger_price.filter(|p| *p != 0.0))?;

    let role = match typed_role {
        Some(role) => role,
        None => infer_role(order.side?, quantity, entry_price, trigger_price)?,
    };

    Some((role, trigger_price))
}

fn parse_order_id(id: Option<&str>) -> i64 {
    match id.map(|s| s.trim().parse::<i64>()) {
        Some(Ok(id)) => id,
        Some(Err(_)) | None => {
            tracing::debug!(?id, "Order id is not numeric, leaving link unset");
            NO_ORDER
        }
    }
}

/// Overwrite the exit plan with live trigger orders, in arrival order
pub fn reconcile_orders(position: &mut Position, orders: &[RawOrder]) {
    for order in orders {
        let Some((role, trigger_price)) =
            classify_order(order, position.quantity, position.entry_price)
        else {
            continue;
        };

        let order_id = parse_order_id(order.id.as_deref());
        match role {
            TriggerRole::StopLoss => {
                position.exit_plan.stop_loss = trigger_price;
                position.sl_oid = order_id;
            }
            TriggerRole::TakeProfit => {
                position.exit_plan.profit_target = trigger_price;
                position.tp_oid = order_id;
            }
        }

        tracing::debug!(
            symbol = %position.symbol,
            ?role,
            trigger_price,
            order_id,
            "Linked trigger order"
        );
    }
}
