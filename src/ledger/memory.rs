//! In-memory ledger store, for tests and ephemeral runs

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{LedgerStore, SeenOrders};
use crate::error::Result;

/// Clones share the same snapshot, so a test can keep a handle after
/// boxing one into a ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Arc<Mutex<SeenOrders>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn with_orders(orders: SeenOrders) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(orders)),
            saves: Arc::default(),
        }
    }

    pub async fn snapshot(&self) -> SeenOrders {
        self.snapshot.lock().await.clone()
    }

    /// Number of times a snapshot has been saved
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> SeenOrders {
        self.snapshot.lock().await.clone()
    }

    async fn save(&self, orders: &SeenOrders) -> Result<()> {
        *self.snapshot.lock().await = orders.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
