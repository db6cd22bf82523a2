//! Currency formatting helpers for conversational responses.

/// Format a dollar amount with thousands separators and two decimals,
/// e.g. `fmt_usd(75000.0)` -> `"$75,000.00"`. Negative amounts render as
/// `-$1,234.00`.
pub fn fmt_usd(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = cents / 100;
    let fraction = cents % 100;

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

/// Format a dollar amount with no cents, e.g. `"$8,114"`.
pub fn fmt_usd_whole(amount: f64) -> String {
    let negative = amount < 0.0;
    let dollars = amount.abs().round() as u64;

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}")
}

/// Format a confidence score as a whole percentage, e.g. `"92%"`.
pub fn fmt_percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}
