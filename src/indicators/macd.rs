/// Moving Average Convergence Divergence (MACD)
///
/// MACD line = EMA(fast) - EMA(slow), signal line = EMA(signal) of the MACD line,
/// histogram = MACD - signal. All three series are aligned with the input; entries
/// before each line becomes defined are 0.0.
use super::{ensure_len, ensure_period, moving_average::calculate_ema, IndicatorError};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Calculate MACD with explicit periods
///
/// Requires at least `slow + signal - 1` values.
pub fn calculate_macd(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<Macd, IndicatorError> {
    ensure_period("macd", fast)?;
    ensure_period("macd", slow)?;
    ensure_period("macd", signal)?;
    if fast >= slow {
        return Err(IndicatorError::InvalidPeriod {
            indicator: "macd",
            period: fast,
        });
    }
    ensure_len("macd", prices, slow + signal - 1)?;

    let fast_ema = calculate_ema(prices, fast)?;
    let slow_ema = calculate_ema(prices, slow)?;

    // MACD line is defined once the slow EMA is
    let macd_start = slow - 1;
    let mut macd = vec![0.0; prices.len()];
    for i in macd_start..prices.len() {
        macd[i] = fast_ema[i] - slow_ema[i];
    }

    let signal_tail = calculate_ema(&macd[macd_start..], signal)?;
    let signal_start = macd_start + signal - 1;

    let mut signal_line = vec![0.0; prices.len()];
    let mut histogram = vec![0.0; prices.len()];
    for i in signal_start..prices.len() {
        signal_line[i] = signal_tail[i - macd_start];
        histogram[i] = macd[i] - signal_line[i];
    }

    Ok(Macd {
        macd,
        signal: signal_line,
        histogram,
    })
}

/// MACD(12, 26, 9) histogram
pub fn macd_histogram(prices: &[f64]) -> Result<Vec<f64>, IndicatorError> {
    calculate_macd(prices, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL).map(|m| m.histogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_constant_series() {
        let prices = vec![250.0; 120];
        let hist = macd_histogram(&prices).unwrap();

        assert_eq!(hist.len(), prices.len());
        assert!(hist.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_macd_uptrend_is_positive() {
        let prices: Vec<f64> = (0..100).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let macd = calculate_macd(&prices, 12, 26, 9).unwrap();

        assert!(*macd.macd.last().unwrap() > 0.0);
        assert!(*macd.signal.last().unwrap() > 0.0);
        let last = prices.len() - 1;
        assert!((macd.histogram[last] - (macd.macd[last] - macd.signal[last])).abs() < 1e-12);
    }

    #[test]
    fn test_macd_minimum_length() {
        let prices = vec![1.0; 33];
        assert!(matches!(
            macd_histogram(&prices),
            Err(IndicatorError::InsufficientData {
                required: 34,
                actual: 33,
                ..
            })
        ));

        let prices = vec![1.0; 34];
        let hist = macd_histogram(&prices).unwrap();
        assert_eq!(hist.len(), 34);
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        let prices = vec![1.0; 100];
        assert!(calculate_macd(&prices, 26, 12, 9).is_err());
    }
}
