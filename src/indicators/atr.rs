/// Average True Range (ATR) indicator
///
/// Measures market volatility by calculating the average of true ranges over a period.
/// True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
///
/// Uses Wilder's smoothing (same as RSI) for the moving average.

use super::{ensure_len, ensure_period, IndicatorError};

/// Calculate the ATR series aligned with the input columns
///
/// The first ATR sits at index `period` (simple average of the first `period`
/// true ranges); earlier entries are 0.0.
pub fn calculate_atr(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    ensure_period("atr", period)?;
    if highs.len() != lows.len() || lows.len() != closes.len() {
        return Err(IndicatorError::MismatchedLengths { indicator: "atr" });
    }
    ensure_len("atr", closes, period + 1)?;

    // true_ranges[i] belongs to candle i + 1
    let true_ranges: Vec<f64> = (1..closes.len())
        .map(|i| {
            let prev_close = closes[i - 1];
            (highs[i] - lows[i])
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs())
        })
        .collect();

    let mut atr_series = vec![0.0; closes.len()];

    // First ATR is simple average of first 'period' true ranges
    let mut atr = true_ranges.iter().take(period).sum::<f64>() / period as f64;
    atr_series[period] = atr;

    // Apply Wilder's smoothing for subsequent values
    for i in period..true_ranges.len() {
        atr = (atr * (period as f64 - 1.0) + true_ranges[i]) / period as f64;
        atr_series[i + 1] = atr;
    }

    Ok(atr_series)
}
