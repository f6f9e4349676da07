// Technical indicators module
// Implements EMA, SMA, RSI, MACD and ATR as series aligned to their input

pub mod atr;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use atr::calculate_atr;
pub use macd::{calculate_macd, Macd};
pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::calculate_rsi;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("insufficient data for {indicator}: need at least {required} values, got {actual}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("invalid period for {indicator}: {period}")]
    InvalidPeriod {
        indicator: &'static str,
        period: usize,
    },

    #[error("mismatched input lengths for {indicator}")]
    MismatchedLengths { indicator: &'static str },
}

/// Fail unless `values` holds at least `required` entries
pub(crate) fn ensure_len(
    indicator: &'static str,
    values: &[f64],
    required: usize,
) -> Result<(), IndicatorError> {
    if values.len() < required {
        return Err(IndicatorError::InsufficientData {
            indicator,
            required,
            actual: values.len(),
        });
    }
    Ok(())
}

pub(crate) fn ensure_period(indicator: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { indicator, period });
    }
    Ok(())
}

/// Latest value of a series
pub fn current(indicator: &'static str, series: &[f64]) -> Result<f64, IndicatorError> {
    series
        .last()
        .copied()
        .ok_or(IndicatorError::InsufficientData {
            indicator,
            required: 1,
            actual: 0,
        })
}

/// Last `min(n, len)` values, oldest first
pub fn last_n(series: &[f64], n: usize) -> &[f64] {
    &series[series.len().saturating_sub(n)..]
}
