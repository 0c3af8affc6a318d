//! Exchange info API access
//!
//! The tracker only issues read-only queries: the open orders of one account
//! and the current mid prices of every listed coin.

mod client;

pub use client::InfoClient;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

/// Read-only queries against the exchange info endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeInfo: Send + Sync {
    /// Raw open-order records for `user`, in whatever shape the API returns
    async fn open_orders(&self, user: &str) -> Result<Vec<serde_json::Value>>;

    /// Mid price per coin identifier, as the textual decimals the API returns
    async fn all_mids(&self) -> Result<HashMap<String, String>>;
}
