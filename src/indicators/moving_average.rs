use super::{ensure_len, ensure_period, IndicatorError};

/// Calculate Simple Moving Average (SMA) series
///
/// Entry `i` (for `i >= period - 1`) is the mean of the `period` values ending at `i`.
/// Earlier entries are 0.0.
pub fn calculate_sma(values: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    ensure_period("sma", period)?;
    ensure_len("sma", values, period)?;

    let mut sma = vec![0.0; values.len()];
    let mut window_sum: f64 = values[..period].iter().sum();
    sma[period - 1] = window_sum / period as f64;

    for i in period..values.len() {
        window_sum += values[i] - values[i - period];
        sma[i] = window_sum / period as f64;
    }

    Ok(sma)
}

/// Calculate Exponential Moving Average (EMA) series
///
/// Seeded with the SMA of the first `period` values, then smoothed with
/// `2 / (period + 1)`. Entries before `period - 1` are 0.0.
pub fn calculate_ema(values: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    ensure_period("ema", period)?;
    ensure_len("ema", values, period)?;

    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut ema = vec![0.0; values.len()];
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    ema[period - 1] = current;

    for i in period..values.len() {
        current = (values[i] - current) * multiplier + current;
        ema[i] = current;
    }

    Ok(ema)
}
