//! Alert message formatting

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::orders::Order;
use crate::prices::coin_name;

/// One alert message for a large order
pub fn format_alert(address: &str, order: &Order, value_usd: Decimal, at: DateTime<Utc>) -> String {
    let price = match order.limit_price {
        Some(limit) => format!("${}", limit.normalize()),
        None => "Market".to_string(),
    };

    format!(
        "🚨 LARGE ORDER ALERT 🚨\n\n\
         Address: {address}\n\
         Coin: {coin}\n\
         Side: {side}\n\
         Size: {size}\n\
         Price: {price}\n\
         Total Value: {value}\n\
         Time: {time}\n\n\
         View Address: https://hyperliquid.xyz/address/{address}",
        coin = coin_label(&order.instrument),
        side = order.side,
        size = order.size.normalize(),
        value = format_usd(value_usd),
        time = at.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

/// Whole US dollars with thousands separators, e.g. `$1,234,568`
pub fn format_usd(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn coin_label(instrument: &str) -> String {
    if instrument.is_empty() {
        return "Unknown".to_string();
    }
    if instrument.chars().all(|c| c.is_ascii_digit()) {
        return format!("{} ({})", instrument, coin_name(instrument).unwrap_or("Unknown"));
    }
    instrument.to_string()
}
