//! Optional startup diagnostics
//!
//! None of these are fatal; each logs what it found and returns.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::exchange::{ExchangeInfo, InfoClient};
use crate::notifier::Notifier;

const STARTUP_MESSAGE: &str = "🤖 Hyperliquid order tracker started successfully!";
const TEST_MESSAGE: &str =
    "🧪 TEST MESSAGE 🧪\n\nHyperliquid order tracker is running and can send alerts.";

/// Announce the tracker on the alert channel
pub async fn send_startup_message(notifier: &dyn Notifier) {
    if !notifier.delivers() {
        return;
    }
    match notifier.send(STARTUP_MESSAGE).await {
        Ok(()) => info!("Startup message sent"),
        Err(e) => error!(error = %e, "Error sending startup message"),
    }
}

/// Send one test message and report whether it arrived
pub async fn test_connectivity(notifier: &dyn Notifier) -> bool {
    if !notifier.delivers() {
        warn!("Cannot test Telegram: set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID");
        return false;
    }

    info!("Sending Telegram test message");
    match notifier.send(TEST_MESSAGE).await {
        Ok(()) => {
            info!("Telegram test message sent");
            true
        }
        Err(e) => {
            error!(
                error = %e,
                hint = "check the bot token and chat id, and that the chat has not blocked the bot",
                "Telegram test message failed"
            );
            false
        }
    }
}

/// Log the shape of the `allMids` and `meta` responses
pub async fn run_api_debug(client: &InfoClient) {
    match client.all_mids().await {
        Ok(mids) => {
            let mut coins: Vec<&String> = mids.keys().collect();
            coins.sort();
            let sample: Vec<String> = coins
                .iter()
                .take(3)
                .map(|coin| format!("{}: {}", coin, mids[*coin]))
                .collect();
            info!(
                count = mids.len(),
                first_keys = ?coins.iter().take(5).collect::<Vec<_>>(),
                sample = ?sample,
                "allMids probe"
            );
        }
        Err(e) => error!(error = %e, "allMids probe failed"),
    }

    match client.meta().await {
        Ok(meta) => {
            let names = universe_names(&meta);
            info!(
                universe = names.len(),
                first = ?names.iter().take(10).collect::<Vec<_>>(),
                "meta probe"
            );
        }
        Err(e) => warn!(error = %e, "meta probe failed"),
    }
}

fn universe_names(meta: &Value) -> Vec<String> {
    meta.get("universe")
        .and_then(Value::as_array)
        .map(|assets| {
            assets
                .iter()
                .filter_map(|asset| asset.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
