//! Configuration module for the order tracker
//!
//! Built once at startup and shared as `Arc<Config>`. Nothing outside this
//! module reads the process environment.

use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TrackerError};
use crate::schedule::Schedule;

const DEFAULT_TARGET_ADDRESS: &str = "0xf3f496c9486be5924a93d67e98298733bb47057c";
const DEFAULT_INFO_ENDPOINT: &str = "https://api.hyperliquid.xyz/info";
const DEFAULT_CHECK_INTERVAL: &str = "*/30 * * * * *";
const DEFAULT_CLEANUP_SCHEDULE: &str = "0 0 * * *";

/// Telegram credentials. Both parts must be present for alerts to be delivered.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API token obtained from BotFather
    pub bot_token: String,
    /// Numeric chat id or `@channel` username
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Account whose open orders are monitored
    pub target_address: String,

    /// Orders valued at or above this many USD trigger an alert
    pub large_order_threshold: Decimal,

    /// Polling schedule for the alert cycle
    pub check_interval: Schedule,

    /// Schedule for expiring old ledger entries
    pub cleanup_schedule: Schedule,

    /// How long a seen order suppresses re-alerting
    pub retention: Duration,

    /// Exchange info endpoint
    pub info_endpoint: String,

    /// Durable seen-order ledger file
    pub seen_orders_path: PathBuf,

    /// Per-request timeout for exchange calls
    pub http_timeout: Duration,

    /// Port for the health/metrics server
    pub health_port: u16,

    /// `None` degrades alerting to log-only
    pub telegram: Option<TelegramConfig>,

    pub send_startup_message: bool,
    pub debug_mode: bool,
    pub test_telegram: bool,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let large_order_threshold = match non_empty("LARGE_ORDER_THRESHOLD") {
            Some(raw) => parse_threshold(&raw)?,
            None => Decimal::from(50_000),
        };

        let check_interval = Schedule::parse(
            &non_empty("CHECK_INTERVAL").unwrap_or_else(|| DEFAULT_CHECK_INTERVAL.to_string()),
        )?;
        let cleanup_schedule = Schedule::parse(
            &non_empty("CLEANUP_SCHEDULE").unwrap_or_else(|| DEFAULT_CLEANUP_SCHEDULE.to_string()),
        )?;

        let retention_hours: u64 = parse_or(
            "SEEN_ORDERS_RETENTION_HOURS",
            non_empty("SEEN_ORDERS_RETENTION_HOURS"),
            24,
        )?;
        let retention_secs = retention_hours.checked_mul(3600).ok_or_else(|| {
            TrackerError::Config(format!(
                "SEEN_ORDERS_RETENTION_HOURS is too large: {}",
                retention_hours
            ))
        })?;
        let http_timeout_secs: u64 =
            parse_or("HTTP_TIMEOUT_SECS", non_empty("HTTP_TIMEOUT_SECS"), 10)?;
        let health_port: u16 = parse_or("HEALTH_PORT", non_empty("HEALTH_PORT"), 9090)?;

        let telegram = match (non_empty("TELEGRAM_BOT_TOKEN"), non_empty("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        Ok(Self {
            target_address: non_empty("TARGET_ADDRESS")
                .unwrap_or_else(|| DEFAULT_TARGET_ADDRESS.to_string()),
            large_order_threshold,
            check_interval,
            cleanup_schedule,
            retention: Duration::from_secs(retention_secs),
            info_endpoint: non_empty("HYPERLIQUID_INFO_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_INFO_ENDPOINT.to_string()),
            seen_orders_path: non_empty("SEEN_ORDERS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./seenOrders.json")),
            http_timeout: Duration::from_secs(http_timeout_secs),
            health_port,
            telegram,
            send_startup_message: flag(non_empty("SEND_STARTUP_MESSAGE")),
            debug_mode: flag(non_empty("DEBUG_MODE")),
            test_telegram: flag(non_empty("TEST_TELEGRAM")),
        })
    }

    /// Retention window in milliseconds, as used by the ledger sweep
    pub fn retention_ms(&self) -> i64 {
        i64::try_from(self.retention.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_address: DEFAULT_TARGET_ADDRESS.to_string(),
            large_order_threshold: Decimal::from(50_000),
            check_interval: Schedule::Every(Duration::from_secs(30)),
            cleanup_schedule: Schedule::Daily { hour: 0, minute: 0 },
            retention: Duration::from_secs(24 * 3600),
            info_endpoint: DEFAULT_INFO_ENDPOINT.to_string(),
            seen_orders_path: PathBuf::from("./seenOrders.json"),
            http_timeout: Duration::from_secs(10),
            health_port: 9090,
            telegram: None,
            send_startup_message: false,
            debug_mode: false,
            test_telegram: false,
        }
    }
}

fn parse_threshold(raw: &str) -> Result<Decimal> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(Decimal::from(value)),
        _ => Err(TrackerError::Config(format!(
            "LARGE_ORDER_THRESHOLD must be a positive integer, got '{}'",
            raw
        ))),
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| TrackerError::Config(format!("{} has an invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

fn flag(raw: Option<String>) -> bool {
    matches!(raw.as_deref(), Some("true") | Some("1"))
}
