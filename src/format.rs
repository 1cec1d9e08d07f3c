//! Display formatting shared by the TUI and the batch report.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// US-dollar currency, e.g. `$1,234.50` or `-$20.00`.
pub fn usd(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    let sign = if value.is_sign_negative() && value != 0.0 {
        "-"
    } else {
        ""
    };
    if value.is_infinite() {
        return format!("{sign}$∞");
    }
    format!("{sign}${}", format_with_commas(value.abs()))
}

/// Two-decimal percentage. Non-finite values read `NaN%`, `Infinity%`, `-Infinity%`.
pub fn percent(value: f64) -> String {
    if value.is_nan() {
        "NaN%".to_string()
    } else if value == f64::INFINITY {
        "Infinity%".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity%".to_string()
    } else {
        format!("{}%", two_decimals(value))
    }
}

/// en-US short date, `M/D/YYYY`.
pub fn us_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Strictly greater than zero. Zero and NaN are not positive.
pub fn is_positive(value: f64) -> bool {
    value > 0.0
}

/// Rounds the exact binary value to cents, ties away from zero.
fn two_decimals(value: f64) -> String {
    match Decimal::from_f64_retain(value) {
        Some(d) => format!(
            "{:.2}",
            d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => format!("{value:.2}"),
    }
}

fn format_with_commas(value: f64) -> String {
    let formatted = two_decimals(value);
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let grouped = digits
        .rchunks(3)
        .rev()
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",");

    format!("{grouped}.{decimal_part}")
}
