//! Canonical order model
//!
//! Raw exchange records are normalized into [`Order`] once, valued against
//! the cycle's price table, and fingerprinted for deduplication.

mod normalize;
mod valuation;

pub use normalize::normalize;
pub use valuation::{appraise, value_usd, PriceSource, Valuation};

use rust_decimal::Decimal;
use std::fmt;

/// Side of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// An open order in canonical shape
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Coin identifier as reported (symbolic like "BTC" or numeric-coded)
    pub instrument: String,
    pub side: Side,
    /// Set when the record carried no usable side indicator and `side` is a default
    pub side_defaulted: bool,
    /// Never negative; zero when missing or unparseable
    pub size: Decimal,
    /// Only present when positive
    pub limit_price: Option<Decimal>,
    pub raw_id: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp_hint: Option<i64>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            instrument: String::new(),
            side: Side::Sell,
            side_defaulted: true,
            size: Decimal::ZERO,
            limit_price: None,
            raw_id: None,
            timestamp_hint: None,
        }
    }
}

impl Order {
    /// Deduplication fingerprint: `{rawId}-{instrument}-{size}-{timestamp}`.
    ///
    /// Without a timestamp hint the last part is `-`, so an untimestamped
    /// order keeps the same key for as long as it rests on the book.
    pub fn key(&self) -> String {
        let hint = self
            .timestamp_hint
            .map(|ms| ms.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{}-{}-{}-{}",
            self.raw_id.as_deref().unwrap_or(""),
            self.instrument,
            self.size.normalize(),
            hint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order {
            instrument: "BTC".to_string(),
            side: Side::Buy,
            side_defaulted: false,
            size: dec!(1.50),
            limit_price: Some(dec!(60000)),
            raw_id: Some("A1".to_string()),
            timestamp_hint: Some(1_700_000_000_000),
        }
    }

    #[test]
    fn test_key_uses_timestamp_hint() {
        assert_eq!(order().key(), "A1-BTC-1.5-1700000000000");
    }

    #[test]
    fn test_key_without_timestamp_uses_placeholder() {
        let untimed = Order {
            timestamp_hint: None,
            ..order()
        };
        assert_eq!(untimed.key(), "A1-BTC-1.5--");
        assert_ne!(untimed.key(), order().key());
    }

    #[test]
    fn test_key_with_missing_id() {
        let anonymous = Order {
            raw_id: None,
            ..order()
        };
        assert_eq!(anonymous.key(), "-BTC-1.5-1700000000000");
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
    }
}
