//! Display formatting for amounts, dates and invoice numbers.

use chrono::{DateTime, Datelike, Utc};

/// en-US style grouping: `1234567.5` → `1,234,567.5`.
///
/// At most three fraction digits are kept and trailing zeros are dropped.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let rendered = format!("{:.3}", amount.abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = amount < 0.0 && (whole != "0" || !fraction.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// `Oct 19, 2026, 3:04:05 PM`
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %-I:%M:%S %p").to_string()
}

/// `{prefix}{YYYY}-{MM}{DD}-{order_number}`, dated by order creation.
pub fn invoice_number(prefix: &str, created_at: &DateTime<Utc>, order_number: &str) -> String {
    format!(
        "{}{}-{:02}{:02}-{}",
        prefix,
        created_at.year(),
        created_at.month(),
        created_at.day(),
        order_number
    )
}
