//! USD valuation of normalized orders
//!
//! Price precedence, first match wins:
//! 1. the order's own limit price (when size is positive)
//! 2. the cycle's price table
//! 3. a hardcoded last-resort price for a few majors
//! 4. nothing, valued at zero
//!
//! A trader's limit price is never overridden by a possibly stale feed.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::Order;
use crate::error::{Result, TrackerError};
use crate::prices::PriceTable;

/// Where the price used for a valuation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Limit,
    Market,
    LastResort,
    Unpriced,
}

/// Result of valuing one order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    pub value_usd: Decimal,
    pub price: Decimal,
    pub source: PriceSource,
}

fn last_resort_price(instrument: &str) -> Option<Decimal> {
    let price = match instrument.trim() {
        "BTC" | "1" => Decimal::new(80_000, 0),
        "ETH" | "2" => Decimal::new(1_950, 0),
        "SOL" | "3" => Decimal::new(145, 0),
        _ => return None,
    };
    Some(price)
}

/// Value an order in USD. Only fails if price x size overflows.
pub fn appraise(order: &Order, prices: &PriceTable) -> Result<Valuation> {
    let size = order.size;

    let (price, source) = match order.limit_price {
        Some(limit) if limit > Decimal::ZERO && size > Decimal::ZERO => {
            (limit, PriceSource::Limit)
        }
        _ => match prices.get(&order.instrument) {
            Some(market) => (market, PriceSource::Market),
            None => match last_resort_price(&order.instrument) {
                Some(fallback) => (fallback, PriceSource::LastResort),
                None => (Decimal::ZERO, PriceSource::Unpriced),
            },
        },
    };

    let value_usd = price
        .checked_mul(size)
        .ok_or(TrackerError::Valuation { price, size })?;

    debug!(
        instrument = %order.instrument,
        price = %price,
        size = %size,
        value_usd = %value_usd,
        source = ?source,
        "Order valued"
    );

    Ok(Valuation {
        value_usd,
        price,
        source,
    })
}

/// USD notional of an order; zero when it cannot be computed
pub fn value_usd(order: &Order, prices: &PriceTable) -> Decimal {
    match appraise(order, prices) {
        Ok(valuation) => valuation.value_usd,
        Err(e) => {
            warn!(error = %e, instrument = %order.instrument, "Valuation failed, using 0");
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{normalize, Side};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn order(instrument: &str, size: Decimal, limit_price: Option<Decimal>) -> Order {
        Order {
            instrument: instrument.to_string(),
            side: Side::Buy,
            side_defaulted: false,
            size,
            limit_price,
            raw_id: None,
            timestamp_hint: None,
        }
    }

    #[test]
    fn test_limit_price_wins_over_table() {
        let mut prices = PriceTable::fallback();
        prices.insert("BTC", dec!(1));

        let cases = [
            (dec!(60000), dec!(1)),
            (dec!(0.5), dec!(3)),
            (dec!(123.45), dec!(0.01)),
        ];
        for (limit, size) in cases {
            let valuation = appraise(&order("BTC", size, Some(limit)), &prices).unwrap();
            assert_eq!(valuation.value_usd, limit * size);
            assert_eq!(valuation.source, PriceSource::Limit);
        }
    }

    #[test]
    fn test_table_price_when_no_limit() {
        let valuation = appraise(&order("SOL", dec!(10), None), &PriceTable::fallback()).unwrap();
        assert_eq!(valuation.value_usd, dec!(1450));
        assert_eq!(valuation.source, PriceSource::Market);
    }

    #[test]
    fn test_numeric_coin_resolves_through_table() {
        let valuation = appraise(&order("2", dec!(2), None), &PriceTable::fallback()).unwrap();
        assert_eq!(valuation.value_usd, dec!(3900));
    }

    #[test]
    fn test_last_resort_when_table_misses() {
        let valuation = appraise(&order("ETH", dec!(2), None), &PriceTable::default()).unwrap();
        assert_eq!(valuation.value_usd, dec!(3900));
        assert_eq!(valuation.source, PriceSource::LastResort);
    }

    #[test]
    fn test_unknown_instrument_is_zero() {
        let valuation = appraise(&order("NOPE", dec!(5), None), &PriceTable::default()).unwrap();
        assert_eq!(valuation.value_usd, Decimal::ZERO);
        assert_eq!(valuation.source, PriceSource::Unpriced);
    }

    #[test]
    fn test_zero_size_falls_through_to_table() {
        let zero_size = order("BTC", Decimal::ZERO, Some(dec!(60000)));
        let valuation = appraise(&zero_size, &PriceTable::fallback()).unwrap();
        assert_eq!(valuation.source, PriceSource::Market);
        assert_eq!(valuation.value_usd, Decimal::ZERO);
    }

    #[test]
    fn test_non_numeric_size_values_to_zero() {
        let raw = json!({ "oid": "X", "coin": "BTC", "sz": "abc", "limitPx": "60000" });
        assert_eq!(value_usd(&normalize(&raw), &PriceTable::fallback()), Decimal::ZERO);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = order("BTC", Decimal::MAX, Some(Decimal::MAX));
        assert!(matches!(
            appraise(&huge, &PriceTable::default()),
            Err(TrackerError::Valuation { .. })
        ));
        assert_eq!(value_usd(&huge, &PriceTable::default()), Decimal::ZERO);
    }
}
