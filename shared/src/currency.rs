//! Currency precision rules
//!
//! Rupiah-class currencies are printed and rounded without decimals,
//! everything else uses two decimal places.

/// Currency codes treated as zero-decimal
const ZERO_DECIMAL_CURRENCIES: &[&str] = &["IDR", "RP"];

/// Whether the currency is printed and rounded without minor units
pub fn is_zero_decimal_currency(code: &str) -> bool {
    let code = code.trim();
    ZERO_DECIMAL_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code))
}

/// Decimal places used when rounding totals in this currency
pub fn currency_precision(code: &str) -> u32 {
    if is_zero_decimal_currency(code) { 0 } else { 2 }
}
