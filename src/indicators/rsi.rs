use super::{ensure_len, ensure_period, IndicatorError};

/// Calculate Relative Strength Index (RSI) series using Wilder's smoothing
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// The first value sits at index `period` (simple average of the first `period`
/// gains and losses); earlier entries are 0.0. A zero average loss yields 100.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    ensure_period("rsi", period)?;
    ensure_len("rsi", prices, period + 1)?;

    let mut rsi = vec![0.0; prices.len()];

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    rsi[period] = rsi_value(avg_gain, avg_loss);

    let smoothing = period as f64 - 1.0;
    for i in (period + 1)..prices.len() {
        let change = prices[i] - prices[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };

        avg_gain = (avg_gain * smoothing + gain) / period as f64;
        avg_loss = (avg_loss * smoothing + loss) / period as f64;
        rsi[i] = rsi_value(avg_gain, avg_loss);
    }

    Ok(rsi)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}
