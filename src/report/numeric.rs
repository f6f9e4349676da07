// printf-style float rendering used by the reports (%g, %e, slice views)

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_sign_positive() {
        "+Inf".to_string()
    } else {
        "-Inf".to_string()
    }
}

fn trim_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Rewrite Rust's `1.5e-5` exponent as `e-05`: explicit sign, at least two digits
fn normalize_exponent(mantissa: &str, exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
}

fn split_scientific(text: &str) -> (&str, i32) {
    match text.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or_default()),
        None => (text, 0),
    }
}

/// `%.{precision}g`: shortest of fixed/scientific at `precision` significant
/// digits with trailing zeros removed
///
/// ```
/// use ashvattha::report::format_general;
/// assert_eq!(format_general(105000.0, 6), "105000");
/// assert_eq!(format_general(1234567.0, 6), "1.23457e+06");
/// assert_eq!(format_general(0.00001, 6), "1e-05");
/// ```
pub fn format_general(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }

    let precision = precision.max(1);
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Exponent after rounding to `precision` significant digits
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = split_scientific(&scientific);

    if exponent < -4 || exponent >= precision as i32 {
        normalize_exponent(trim_fraction_zeros(mantissa), exponent)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let fixed = format!("{:.*}", decimals, value);
        trim_fraction_zeros(&fixed).to_string()
    }
}

/// `%.{precision}e`, e.g. `1.26e-05`
pub fn format_scientific(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }

    let scientific = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = split_scientific(&scientific);
    normalize_exponent(mantissa, exponent)
}

/// `[a, b, c]` with three decimals per element, `[]` when empty
pub fn format_float_slice(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:.3}", v)).collect();
    format!("[{}]", items.join(", "))
}
