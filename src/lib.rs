//! Hyperliquid Large-Order Tracker - Library
//!
//! Polls one account's open orders, values each order in USD and sends a
//! single alert per order above a threshold, remembering alerted orders
//! across restarts.

use std::sync::Arc;

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod metrics;
pub mod notifier;
pub mod orders;
pub mod prices;
pub mod schedule;
pub mod tracker;

pub use config::Config;
pub use error::{Result, TrackerError};
pub use exchange::{ExchangeInfo, InfoClient};
pub use ledger::{JsonFileStore, LedgerStore, MemoryStore, SeenOrderLedger, SeenOrderRecord};
pub use metrics::Metrics;
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use orders::{normalize, value_usd, Order, Side};
pub use prices::{PriceResolver, PriceTable};
pub use schedule::Schedule;
pub use tracker::{CycleReport, OrderTracker};

/// State shared with the health server
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub config: Arc<Config>,
}
