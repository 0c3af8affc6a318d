//! Order normalization
//!
//! Open-order records arrive with fields under different names depending on
//! the API version or fixture that produced them. Every "which field wins"
//! decision lives here; the rest of the crate only sees [`Order`].

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::warn;

use super::{Order, Side};

const INSTRUMENT_FIELDS: &[&str] = &["coin", "asset", "symbol"];
const SIZE_FIELDS: &[&str] = &["sz", "size", "quantity", "amount"];
const PRICE_FIELDS: &[&str] = &["limitPx", "px", "price"];
const ID_FIELDS: &[&str] = &["oid", "id", "orderId"];
const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "time"];

/// Map a raw order record to the canonical shape. Never fails: anything
/// unrecoverable falls back to a neutral value and is logged.
pub fn normalize(raw: &Value) -> Order {
    let Some(fields) = raw.as_object() else {
        warn!(raw = %raw, "Order record is not an object");
        return Order::default();
    };

    let instrument = match first_present(fields, INSTRUMENT_FIELDS).and_then(scalar_text) {
        Some(coin) => coin,
        None => {
            warn!(raw = %raw, "Order has no instrument");
            String::new()
        }
    };

    let (side, side_defaulted) = match side_of(fields) {
        Some(side) => (side, false),
        None => {
            // SELL is a placeholder; callers can tell via `side_defaulted`.
            warn!(raw = %raw, "Order has no side indicator, defaulting to SELL");
            (Side::Sell, true)
        }
    };

    Order {
        instrument,
        side,
        side_defaulted,
        size: size_of(fields, raw),
        limit_price: limit_price_of(fields, raw),
        raw_id: first_present(fields, ID_FIELDS).and_then(scalar_text),
        timestamp_hint: first_present(fields, TIMESTAMP_FIELDS).and_then(parse_millis),
    }
}

/// First non-null value among `names`, in order
fn first_present<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !value.is_null())
}

fn side_of(fields: &Map<String, Value>) -> Option<Side> {
    let explicit = fields.get("side").and_then(Value::as_str).and_then(|s| {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "buy" | "bid" | "long" => Some(Side::Buy),
            "a" | "s" | "sell" | "ask" | "short" => Some(Side::Sell),
            _ => None,
        }
    });

    explicit.or_else(|| {
        fields.get("isBuy").and_then(Value::as_bool).map(|is_buy| {
            if is_buy {
                Side::Buy
            } else {
                Side::Sell
            }
        })
    })
}

fn size_of(fields: &Map<String, Value>, raw: &Value) -> Decimal {
    let Some(value) = first_present(fields, SIZE_FIELDS) else {
        warn!(raw = %raw, "Order has no size field, using 0");
        return Decimal::ZERO;
    };

    match parse_decimal(value) {
        Some(size) if size >= Decimal::ZERO => size,
        Some(size) => {
            warn!(size = %size, raw = %raw, "Order has a negative size, using 0");
            Decimal::ZERO
        }
        None => {
            warn!(size = %value, raw = %raw, "Order size is not numeric, using 0");
            Decimal::ZERO
        }
    }
}

fn limit_price_of(fields: &Map<String, Value>, raw: &Value) -> Option<Decimal> {
    let value = first_present(fields, PRICE_FIELDS)?;
    match parse_decimal(value) {
        Some(price) if price > Decimal::ZERO => Some(price),
        _ => {
            warn!(price = %value, raw = %raw, "Ignoring unusable limit price");
            None
        }
    }
}

/// Decimal from a JSON string or number
fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    // Decimal::from_str reads "1_000" as 1000
    if text.contains('_') {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings and numbers as text; empty strings count as absent
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_normalize_hyperliquid_shape() {
        let order = normalize(&json!({
            "coin": "BTC",
            "side": "B",
            "limitPx": "60000.0",
            "sz": "1.25",
            "oid": 91490942,
            "timestamp": 1681247412573u64
        }));

        assert_eq!(order.instrument, "BTC");
        assert_eq!(order.side, Side::Buy);
        assert!(!order.side_defaulted);
        assert_eq!(order.size, dec!(1.25));
        assert_eq!(order.limit_price, Some(dec!(60000)));
        assert_eq!(order.raw_id.as_deref(), Some("91490942"));
        assert_eq!(order.timestamp_hint, Some(1681247412573));
    }

    #[test]
    fn test_field_precedence() {
        let order = normalize(&json!({
            "asset": "ETH",
            "size": "3",
            "quantity": "99",
            "px": "2000",
            "price": "1"
        }));
        assert_eq!(order.instrument, "ETH");
        assert_eq!(order.size, dec!(3));
        assert_eq!(order.limit_price, Some(dec!(2000)));

        let order = normalize(&json!({ "coin": "SOL", "amount": 7 }));
        assert_eq!(order.size, dec!(7));
        assert_eq!(order.limit_price, None);
    }

    #[test]
    fn test_null_fields_are_skipped() {
        let order = normalize(&json!({ "coin": "SOL", "sz": null, "size": "4" }));
        assert_eq!(order.size, dec!(4));
    }

    #[test]
    fn test_side_inference() {
        assert_eq!(normalize(&json!({ "side": "A" })).side, Side::Sell);
        assert_eq!(normalize(&json!({ "side": "sell" })).side, Side::Sell);
        assert_eq!(normalize(&json!({ "isBuy": true })).side, Side::Buy);

        // unrecognised explicit side falls through to the boolean indicator
        let order = normalize(&json!({ "side": "?", "isBuy": true }));
        assert_eq!(order.side, Side::Buy);
        assert!(!order.side_defaulted);

        let order = normalize(&json!({ "coin": "BTC" }));
        assert_eq!(order.side, Side::Sell);
        assert!(order.side_defaulted);
    }

    #[test]
    fn test_malformed_values_become_neutral() {
        let order = normalize(&json!({
            "coin": "BTC",
            "sz": "lots",
            "limitPx": "cheap"
        }));
        assert_eq!(order.size, Decimal::ZERO);
        assert_eq!(order.limit_price, None);

        let order = normalize(&json!({ "coin": "BTC", "sz": "-2", "limitPx": "0" }));
        assert_eq!(order.size, Decimal::ZERO);
        assert_eq!(order.limit_price, None);

        let order = normalize(&json!({ "coin": "BTC", "sz": "1_000", "limitPx": "60_000" }));
        assert_eq!(order.size, Decimal::ZERO);
        assert_eq!(order.limit_price, None);
    }

    #[test]
    fn test_non_object_record() {
        let order = normalize(&json!("not an order"));
        assert_eq!(order, Order::default());
    }

    #[test]
    fn test_numeric_coin_and_scientific_size() {
        let order = normalize(&json!({ "coin": 2, "sz": 1e-3 }));
        assert_eq!(order.instrument, "2");
        assert_eq!(order.size, dec!(0.001));
    }
}
