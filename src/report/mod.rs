// Plain-text reports for the LLM prompt

pub mod numeric;

pub use numeric::{format_float_slice, format_general, format_scientific};

use crate::indicators::last_n;
use crate::models::{base_asset, AccountSnapshot, MarketSnapshot, Position};

/// Number of trailing values shown per series
pub const SERIES_WINDOW: usize = 10;

fn series_view(series: &[f64]) -> String {
    format_float_slice(last_n(series, SERIES_WINDOW))
}

impl MarketSnapshot {
    /// Render the snapshot as a deterministic text block
    pub fn format(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("\n========== {} Analysis ==========\n\n", self.symbol));
        out.push_str(&format!(
            "current_price = {:.1}, current_ema20 = {:.3}, current_macd = {:.3}, current_rsi (7 period) = {:.3}\n\n",
            self.current_price, self.current_ema20, self.current_macd, self.current_rsi7
        ));

        out.push_str(&format!(
            "In addition, here is the latest {} open interest and funding rate for perps (the instrument you are trading):\n\n",
            base_asset(&self.symbol)
        ));
        // Only the latest open interest is known, so it doubles as the average
        if self.open_interest != 0.0 {
            out.push_str(&format!(
                "Open Interest: Latest: {:.2} Average: {:.2}\n\n",
                self.open_interest, self.open_interest
            ));
        }
        if self.funding_rate != 0.0 {
            out.push_str(&format!(
                "Funding Rate: {}\n\n",
                format_scientific(self.funding_rate, 2)
            ));
        }

        out.push_str("Intraday series (by minute, oldest → latest):\n\n");
        out.push_str(&format!("Mid prices: {}\n\n", series_view(&self.closes_1m)));
        out.push_str(&format!(
            "EMA indicators (20‑period): {}\n\n",
            series_view(&self.ema20_1m)
        ));
        out.push_str(&format!("MACD indicators: {}\n\n", series_view(&self.macd_hist_1m)));
        out.push_str(&format!(
            "RSI indicators (7‑Period): {}\n\n",
            series_view(&self.rsi7_1m)
        ));
        out.push_str(&format!(
            "RSI indicators (14‑Period): {}\n\n",
            series_view(&self.rsi14_1m)
        ));

        out.push_str("Longer‑term context (4‑hour timeframe):\n\n");
        out.push_str(&format!(
            "20‑Period EMA: {:.3} vs. 50‑Period EMA: {:.3}\n\n",
            self.current_ema20_4h, self.current_ema50_4h
        ));
        out.push_str(&format!(
            "3‑Period ATR: {:.3} vs. 14‑Period ATR: {:.3}\n\n",
            self.current_atr3, self.current_atr14
        ));
        out.push_str(&format!(
            "Current Volume: {:.3} vs. Average Volume: {:.3}\n\n",
            self.current_volume, self.avg_volume
        ));
        out.push_str(&format!("MACD indicators: {}\n\n", series_view(&self.macd_hist_4h)));
        out.push_str(&format!(
            "RSI indicators (14‑Period): {}\n\n",
            series_view(&self.rsi14_4h)
        ));

        out.push_str("========================================\n");
        out
    }
}

fn format_position(position: &Position) -> String {
    format!(
        "{{'symbol': '{}', 'quantity': {:.2}, 'entry_price': {:.2}, 'current_price': {:.5}, \
         'liquidation_price': {:.2}, 'unrealized_pnl': {:.2}, 'leverage': {:.0}, \
         'exit_plan': {{'profit_target': {}, 'stop_loss': {}, 'invalidation_condition': '{}'}}, \
         'confidence': {:.2}, 'risk_usd': {:.3}, 'sl_oid': {}, 'tp_oid': {}, \
         'wait_for_fill': {}, 'entry_oid': {}, 'notional_usd': {:.2}}} ",
        position.symbol,
        position.quantity,
        position.entry_price,
        position.current_price,
        position.liquidation_price,
        position.unrealized_pnl,
        position.leverage,
        format_general(position.exit_plan.profit_target, 6),
        format_general(position.exit_plan.stop_loss, 6),
        position.exit_plan.invalidation_condition,
        position.confidence,
        position.risk_usd,
        position.sl_oid,
        position.tp_oid,
        position.wait_for_fill,
        position.entry_oid,
        position.notional_usd,
    )
}

impl AccountSnapshot {
    /// Render account totals and one dict-style entry per position
    pub fn format(&self) -> String {
        let mut out = String::new();

        out.push_str("\nHERE IS YOUR ACCOUNT INFORMATION & PERFORMANCE\n");
        out.push_str(&format!(
            "Current Total Return (percent): {:.2}%\n\n",
            self.total_return_percent
        ));
        out.push_str(&format!("Available Cash: {:.2}\n\n", self.available_cash));
        out.push_str(&format!(
            "Current Account Value: {:.2}\n\n",
            self.current_account_value
        ));

        out.push_str("Current live positions & performance: ");
        for position in &self.positions {
            out.push_str(&format_position(position));
        }
        out.push('\n');

        out.push_str(&format!("\nSharpe Ratio: {:.3}\n", self.sharpe_ratio));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExitPlan, NO_ORDER};

    fn sample_market() -> MarketSnapshot {
        MarketSnapshot {
            symbol: "ETH/USDC:USDC".to_string(),
            closes_1m: (1..=15).map(|i| 3000.0 + i as f64).collect(),
            ema20_1m: vec![2999.5; 15],
            macd_hist_1m: vec![0.25; 3],
            rsi7_1m: vec![55.0; 12],
            rsi14_1m: vec![],
            current_price: 3015.0,
            current_ema20: 2999.5,
            current_macd: 0.25,
            current_rsi7: 55.0,
            current_ema20_4h: 2950.125,
            current_ema50_4h: 2900.0,
            current_atr3: 40.0,
            current_atr14: 45.5,
            current_volume: 1200.0,
            avg_volume: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_market_format_layout() {
        let text = sample_market().format();

        assert!(text.starts_with("\n========== ETH/USDC:USDC Analysis ==========\n\n"));
        assert!(text.contains(
            "current_price = 3015.0, current_ema20 = 2999.500, current_macd = 0.250, current_rsi (7 period) = 55.000\n\n"
        ));
        assert!(text.contains("here is the latest ETH open interest"));
        assert!(text.contains(
            "Mid prices: [3006.000, 3007.000, 3008.000, 3009.000, 3010.000, 3011.000, 3012.000, 3013.000, 3014.000, 3015.000]\n\n"
        ));
        assert!(text.contains("MACD indicators: [0.250, 0.250, 0.250]\n\n"));
        assert!(text.contains("RSI indicators (14‑Period): []\n\n"));
        assert!(text.contains("20‑Period EMA: 2950.125 vs. 50‑Period EMA: 2900.000\n\n"));
        assert!(text.contains("Current Volume: 1200.000 vs. Average Volume: 1000.000\n\n"));
        assert!(text.ends_with("========================================\n"));
    }

    #[test]
    fn test_market_format_skips_zero_perp_metrics() {
        let text = sample_market().format();
        assert!(!text.contains("Open Interest:"));
        assert!(!text.contains("Funding Rate:"));

        let mut market = sample_market();
        market.open_interest = 12345.678;
        market.funding_rate = 0.0000126;
        let text = market.format();
        assert!(text.contains("Open Interest: Latest: 12345.68 Average: 12345.68\n\n"));
        assert!(text.contains("Funding Rate: 1.26e-05\n\n"));
    }

    #[test]
    fn test_account_format_without_positions() {
        let account = AccountSnapshot::new(1000.0, Vec::new());
        let text = account.format();

        assert_eq!(
            text,
            "\nHERE IS YOUR ACCOUNT INFORMATION & PERFORMANCE\n\
             Current Total Return (percent): 0.00%\n\n\
             Available Cash: 1000.00\n\n\
             Current Account Value: 1000.00\n\n\
             Current live positions & performance: \n\
             \nSharpe Ratio: 0.000\n"
        );
        assert_eq!(text, account.format());
    }

    #[test]
    fn test_account_format_position_entry() {
        let position = Position {
            symbol: "BTC/USDC:USDC".to_string(),
            quantity: 0.5,
            entry_price: 100000.0,
            current_price: 105000.0,
            liquidation_price: 80000.0,
            unrealized_pnl: 2500.0,
            leverage: 10.0,
            exit_plan: ExitPlan {
                profit_target: 112500.0,
                stop_loss: 95000.5,
                invalidation_condition: "4h close below 94000".to_string(),
            },
            confidence: 0.7,
            risk_usd: 2500.0,
            sl_oid: 77,
            tp_oid: NO_ORDER,
            wait_for_fill: false,
            entry_oid: NO_ORDER,
            notional_usd: 52500.0,
        };
        let account = AccountSnapshot::new(1000.0, vec![position]);
        let text = account.format();

        assert!(text.contains(
            "Current live positions & performance: {'symbol': 'BTC/USDC:USDC', 'quantity': 0.50, \
             'entry_price': 100000.00, 'current_price': 105000.00000, 'liquidation_price': 80000.00, \
             'unrealized_pnl': 2500.00, 'leverage': 10, 'exit_plan': {'profit_target': 112500, \
             'stop_loss': 95000.5, 'invalidation_condition': '4h close below 94000'}, \
             'confidence': 0.70, 'risk_usd': 2500.000, 'sl_oid': 77, 'tp_oid': -1, \
             'wait_for_fill': false, 'entry_oid': -1, 'notional_usd': 52500.00} \n"
        ));
        assert!(text.contains("Current Account Value: 53500.00\n\n"));
    }
}
