//! Price resolution
//!
//! Builds a best-effort coin -> USD table each cycle from the live mid
//! prices, with a static table filling whatever the live feed is missing.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::exchange::ExchangeInfo;

/// Numeric-coded coin identifiers used by the price feed.
///
/// Incomplete by construction; unknown codes simply have no symbolic alias.
pub const COIN_CODES: &[(&str, &str)] = &[
    ("@1", "BTC"),
    ("@2", "ETH"),
    ("@3", "SOL"),
    ("@4", "AVAX"),
    ("@5", "ARB"),
    ("@6", "DOGE"),
    ("@7", "MATIC"),
    ("@8", "XRP"),
    ("@9", "LINK"),
];

fn static_prices() -> [(&'static str, Decimal); 9] {
    [
        ("BTC", Decimal::new(80_000, 0)),
        ("ETH", Decimal::new(1_950, 0)),
        ("SOL", Decimal::new(145, 0)),
        ("AVAX", Decimal::new(25, 0)),
        ("ARB", Decimal::new(115, 2)),
        ("DOGE", Decimal::new(12, 2)),
        ("MATIC", Decimal::new(65, 2)),
        ("XRP", Decimal::new(52, 2)),
        ("LINK", Decimal::new(135, 1)),
    ]
}

/// Symbolic name for a numeric coin code (`"1"` or `"@1"`)
pub fn coin_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    let code = code.strip_prefix('@').unwrap_or(code);
    COIN_CODES
        .iter()
        .find(|(c, _)| &c[1..] == code)
        .map(|(_, name)| *name)
}

/// Numeric code (`"@1"`) for a symbolic coin name
pub fn coin_code(name: &str) -> Option<&'static str> {
    COIN_CODES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}

/// Coin identifier -> positive USD price
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    prices: HashMap<String, Decimal>,
}

impl PriceTable {
    /// The static table, with both symbolic and numeric-coded keys
    pub fn fallback() -> Self {
        let mut table = Self::default();
        for (coin, price) in static_prices() {
            table.insert(coin, price);
        }
        table.link_codes();
        table
    }

    /// Insert a price; non-positive prices are ignored
    pub fn insert(&mut self, coin: &str, price: Decimal) -> bool {
        if price <= Decimal::ZERO {
            return false;
        }
        self.prices.insert(coin.to_string(), price);
        true
    }

    /// Price for an instrument, trying its symbolic and numeric-coded forms
    pub fn get(&self, instrument: &str) -> Option<Decimal> {
        candidate_keys(instrument)
            .iter()
            .find_map(|key| self.prices.get(key).copied())
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Make symbolic and numeric-coded keys agree. The symbolic price wins
    /// when both are present.
    fn link_codes(&mut self) {
        for (code, name) in COIN_CODES {
            if let Some(price) = self.prices.get(*name).copied() {
                self.prices.insert((*code).to_string(), price);
            } else if let Some(price) = self.prices.get(*code).copied() {
                self.prices.insert((*name).to_string(), price);
            }
        }
    }

    /// Add entries from `other` only where this table has none
    fn fill_gaps_from(&mut self, other: &PriceTable) -> usize {
        let mut filled = 0;
        for (coin, price) in &other.prices {
            if !self.prices.contains_key(coin) {
                self.prices.insert(coin.clone(), *price);
                filled += 1;
            }
        }
        filled
    }
}

/// Lookup keys for an instrument, most specific first
fn candidate_keys(instrument: &str) -> Vec<String> {
    let instrument = instrument.trim();
    if instrument.is_empty() {
        return Vec::new();
    }

    let mut keys = vec![instrument.to_string()];
    if instrument.chars().all(|c| c.is_ascii_digit()) {
        keys.push(format!("@{}", instrument));
        if let Some(name) = coin_name(instrument) {
            keys.push(name.to_string());
        }
    } else if instrument.starts_with('@') {
        if let Some(name) = coin_name(instrument) {
            keys.push(name.to_string());
        }
    } else {
        let upper = instrument.to_uppercase();
        if upper != instrument {
            keys.push(upper);
        }
        if let Some(code) = coin_code(instrument) {
            keys.push(code.to_string());
        }
    }
    keys
}

/// Produces the per-cycle price table. Never fails.
pub struct PriceResolver {
    exchange: Arc<dyn ExchangeInfo>,
}

impl PriceResolver {
    pub fn new(exchange: Arc<dyn ExchangeInfo>) -> Self {
        Self { exchange }
    }

    /// Live mids merged over the static table, or the static table alone
    /// when the live fetch fails
    pub async fn resolve(&self) -> PriceTable {
        let mids = match self.exchange.all_mids().await {
            Ok(mids) => mids,
            Err(e) => {
                warn!(error = %e, "Failed to fetch mid prices, using fallback prices");
                return PriceTable::fallback();
            }
        };

        let mut table = PriceTable::default();
        for (coin, mid) in &mids {
            match Decimal::from_str(mid.trim()) {
                Ok(price) if !mid.contains('_') && table.insert(coin, price) => {}
                _ => debug!(coin = %coin, mid = %mid, "Skipping unusable mid price"),
            }
        }

        let live = table.len();
        table.link_codes();
        let filled = table.fill_gaps_from(&PriceTable::fallback());

        info!(live, filled, total = table.len(), "Price table resolved");
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::exchange::MockExchangeInfo;
    use rust_decimal_macros::dec;

    fn resolver_with(mids: Option<HashMap<String, String>>) -> PriceResolver {
        let mut exchange = MockExchangeInfo::new();
        exchange.expect_all_mids().returning(move || match &mids {
            Some(m) => Ok(m.clone()),
            None => Err(TrackerError::Http("connection refused".to_string())),
        });
        PriceResolver::new(Arc::new(exchange))
    }

    #[test]
    fn test_fallback_resolves_both_key_forms() {
        let table = PriceTable::fallback();
        assert_eq!(table.get("BTC"), Some(dec!(80000)));
        assert_eq!(table.get("@1"), Some(dec!(80000)));
        assert_eq!(table.get("1"), Some(dec!(80000)));
        assert_eq!(table.get("eth"), Some(dec!(1950)));
        assert_eq!(table.get("LINK"), Some(dec!(13.5)));
        assert_eq!(table.get("UNKNOWN"), None);
        assert_eq!(table.get(""), None);
    }

    #[test]
    fn test_insert_rejects_non_positive() {
        let mut table = PriceTable::default();
        assert!(!table.insert("BTC", Decimal::ZERO));
        assert!(!table.insert("BTC", dec!(-1)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_coin_code_lookup() {
        assert_eq!(coin_name("2"), Some("ETH"));
        assert_eq!(coin_name("@9"), Some("LINK"));
        assert_eq!(coin_name("99"), None);
        assert_eq!(coin_code("sol"), Some("@3"));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_fetch_error() {
        let table = resolver_with(None).resolve().await;
        assert_eq!(table, PriceTable::fallback());
    }

    #[tokio::test]
    async fn test_live_prices_win_and_static_fills_gaps() {
        let mids: HashMap<String, String> = [
            ("BTC".to_string(), "91000.5".to_string()),
            ("HYPE".to_string(), "31.2".to_string()),
            ("BROKEN".to_string(), "n/a".to_string()),
            ("SPACED".to_string(), "1_000".to_string()),
        ]
        .into_iter()
        .collect();

        let table = resolver_with(Some(mids)).resolve().await;

        assert_eq!(table.get("BTC"), Some(dec!(91000.5)));
        assert_eq!(table.get("@1"), Some(dec!(91000.5)));
        assert_eq!(table.get("HYPE"), Some(dec!(31.2)));
        assert_eq!(table.get("ETH"), Some(dec!(1950)));
        assert_eq!(table.get("BROKEN"), None);
        assert_eq!(table.get("SPACED"), None);
    }

    #[tokio::test]
    async fn test_numeric_only_live_price_aliases_symbol() {
        let mids: HashMap<String, String> =
            [("@2".to_string(), "2500".to_string())].into_iter().collect();

        let table = resolver_with(Some(mids)).resolve().await;
        assert_eq!(table.get("ETH"), Some(dec!(2500)));
        assert_eq!(table.get("2"), Some(dec!(2500)));
    }
}
