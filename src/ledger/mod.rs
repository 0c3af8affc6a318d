//! Seen-order ledger
//!
//! Durable record of orders that already triggered an alert. Once a key is
//! in the ledger no further alert is sent for it until the expiry sweep
//! removes it. Every change is written through to the backing store as a
//! full snapshot.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::Result;

/// One alerted order, as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenOrderRecord {
    /// When the order first triggered an alert (ms since epoch)
    #[serde(rename = "timestamp")]
    pub first_seen_at_ms: i64,

    /// USD value at the time of the alert
    #[serde(rename = "value")]
    pub value_usd: Decimal,
}

/// Order key -> record
pub type SeenOrders = BTreeMap<String, SeenOrderRecord>;

/// Where ledger snapshots live
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the last snapshot. Missing or unreadable storage yields an empty
    /// snapshot; it never fails.
    async fn load(&self) -> SeenOrders;

    /// Replace the stored snapshot
    async fn save(&self, orders: &SeenOrders) -> Result<()>;
}

/// In-memory view of the seen orders, written through to a [`LedgerStore`]
pub struct SeenOrderLedger {
    records: SeenOrders,
    store: Box<dyn LedgerStore>,
}

impl SeenOrderLedger {
    /// Load the ledger from its store
    pub async fn load(store: Box<dyn LedgerStore>) -> Self {
        let records = store.load().await;
        info!(count = records.len(), "Seen-order ledger loaded");
        Self { records, store }
    }

    pub fn is_seen(&self, order_key: &str) -> bool {
        self.records.contains_key(order_key)
    }

    pub fn get(&self, order_key: &str) -> Option<&SeenOrderRecord> {
        self.records.get(order_key)
    }

    /// Record an alerted order and persist the ledger.
    ///
    /// The in-memory mark stands even if persisting fails.
    pub async fn mark_seen(
        &mut self,
        order_key: &str,
        value_usd: Decimal,
        now_ms: i64,
    ) -> Result<()> {
        self.records.insert(
            order_key.to_string(),
            SeenOrderRecord {
                first_seen_at_ms: now_ms,
                value_usd,
            },
        );
        debug!(order_key = %order_key, value_usd = %value_usd, "Order marked seen");
        self.store.save(&self.records).await
    }

    /// Drop records first seen before `now_ms - retention_ms`. A record
    /// exactly at the cutoff is kept. Persists only when something was
    /// removed; returns how many records were removed.
    pub async fn expire_older_than(&mut self, now_ms: i64, retention_ms: i64) -> Result<usize> {
        let cutoff = now_ms.saturating_sub(retention_ms);
        let before = self.records.len();
        self.records
            .retain(|_, record| record.first_seen_at_ms >= cutoff);

        let removed = before - self.records.len();
        if removed > 0 {
            info!(removed, remaining = self.records.len(), "Expired old seen orders");
            self.store.save(&self.records).await?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
