//! Alert delivery
//!
//! Delivery is fire-and-forget: the caller logs the outcome and never
//! retries or rolls anything back.

mod format;
mod telegram;

pub use format::{format_alert, format_usd};
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::Result;

/// A "send one text message" capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;

    /// Whether messages actually leave the process
    fn delivers(&self) -> bool {
        true
    }
}

/// Stand-in used when no transport is configured: alerts go to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        info!(message = %text, "Telegram credentials not set, alert logged only");
        Ok(())
    }

    fn delivers(&self) -> bool {
        false
    }
}

/// Telegram when credentials are configured, log-only otherwise
pub fn from_config(config: &Config) -> Arc<dyn Notifier> {
    match &config.telegram {
        Some(telegram) => {
            info!(chat_id = %telegram.chat_id, "Telegram notifier initialized");
            Arc::new(TelegramNotifier::new(telegram))
        }
        None => {
            info!("Telegram credentials missing or incomplete, alerts will be logged but not sent");
            Arc::new(LogNotifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier;
        assert!(notifier.send("hello").await.is_ok());
        assert!(!notifier.delivers());
    }

    #[tokio::test]
    async fn test_from_config_degrades_to_log_only() {
        let notifier = from_config(&Config::default());
        assert!(!notifier.delivers());

        let config = Config {
            telegram: Some(TelegramConfig {
                bot_token: "123:abc".to_string(),
                chat_id: "42".to_string(),
            }),
            ..Config::default()
        };
        assert!(from_config(&config).delivers());
    }
}
