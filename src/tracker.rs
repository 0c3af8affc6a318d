//! Alert decision core
//!
//! One polling cycle: fetch open orders, resolve prices, then for each order
//! normalize, value, check the ledger, mark seen and notify. Nothing that
//! goes wrong inside a cycle escapes it.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::exchange::ExchangeInfo;
use crate::ledger::SeenOrderLedger;
use crate::metrics::Metrics;
use crate::notifier::{format_alert, format_usd, Notifier};
use crate::orders::{appraise, normalize};
use crate::prices::{PriceResolver, PriceTable};

/// What happened during one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Another cycle held the ledger; nothing was done
    pub skipped: bool,
    /// Orders could not be fetched
    pub fetch_failed: bool,
    pub fetched: usize,
    pub evaluated: usize,
    pub failed_orders: usize,
    pub already_seen: usize,
    pub alerted: usize,
    pub delivery_failures: usize,
}

/// Watches one account and alerts once per large order
pub struct OrderTracker {
    config: Arc<Config>,
    exchange: Arc<dyn ExchangeInfo>,
    prices: PriceResolver,
    /// Held for a whole cycle, which also keeps cycles from overlapping
    ledger: Mutex<SeenOrderLedger>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<Metrics>,
}

impl OrderTracker {
    pub fn new(
        config: Arc<Config>,
        exchange: Arc<dyn ExchangeInfo>,
        ledger: SeenOrderLedger,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<Metrics>,
    ) -> Self {
        metrics.seen_orders.set(ledger.len() as i64);

        Self {
            config,
            prices: PriceResolver::new(exchange.clone()),
            exchange,
            ledger: Mutex::new(ledger),
            notifier,
            metrics,
        }
    }

    /// Run one polling cycle now
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one polling cycle as of `now`
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        let Ok(mut ledger) = self.ledger.try_lock() else {
            warn!("Previous cycle still running, skipping this one");
            report.skipped = true;
            return report;
        };

        self.metrics.cycles.inc();

        let orders = match self.exchange.open_orders(&self.config.target_address).await {
            Ok(orders) => orders,
            Err(e) => {
                error!(error = %e, address = %self.config.target_address, "Error fetching orders");
                self.metrics.cycle_failures.inc();
                report.fetch_failed = true;
                return report;
            }
        };

        report.fetched = orders.len();
        if orders.is_empty() {
            info!(address = %self.config.target_address, "No orders found for the address");
            return report;
        }

        let prices = self.prices.resolve().await;
        info!(count = orders.len(), "Found orders to analyze");

        for raw in &orders {
            self.process_order(raw, &prices, &mut ledger, now, &mut report)
                .await;
        }

        self.metrics.seen_orders.set(ledger.len() as i64);
        info!(
            evaluated = report.evaluated,
            alerted = report.alerted,
            already_seen = report.already_seen,
            failed_orders = report.failed_orders,
            "Cycle complete"
        );
        report
    }

    async fn process_order(
        &self,
        raw: &Value,
        prices: &PriceTable,
        ledger: &mut SeenOrderLedger,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) {
        let now_ms = now.timestamp_millis();
        let order = normalize(raw);
        let order_key = order.key();

        let valuation = match appraise(&order, prices) {
            Ok(valuation) => valuation,
            Err(e) => {
                error!(error = %e, raw = %raw, "Error processing order");
                report.failed_orders += 1;
                return;
            }
        };

        report.evaluated += 1;
        self.metrics.orders_evaluated.inc();
        info!(
            instrument = %order.instrument,
            size = %order.size,
            value = %format_usd(valuation.value_usd),
            "Order"
        );

        if valuation.value_usd < self.config.large_order_threshold {
            return;
        }
        if ledger.is_seen(&order_key) {
            debug!(order_key = %order_key, "Large order already alerted");
            report.already_seen += 1;
            return;
        }

        info!(
            order_key = %order_key,
            value = %format_usd(valuation.value_usd),
            "Large order detected"
        );
        if order.side_defaulted {
            warn!(order_key = %order_key, raw = %raw, "Alerting with a defaulted side");
        }

        // Marked before sending: a failed send must not lead to a duplicate later.
        if let Err(e) = ledger.mark_seen(&order_key, valuation.value_usd, now_ms).await {
            error!(error = %e, order_key = %order_key, "Error saving seen orders");
        }
        report.alerted += 1;
        self.metrics.alerts.inc();

        let message = format_alert(&self.config.target_address, &order, valuation.value_usd, now);
        match self.notifier.send(&message).await {
            Ok(()) => info!(order_key = %order_key, "Alert sent"),
            Err(e) => {
                error!(error = %e, order_key = %order_key, "Error sending alert");
                report.delivery_failures += 1;
                self.metrics.alert_failures.inc();
            }
        }
    }

    /// Drop ledger entries older than the retention window
    pub async fn expire_seen_orders(&self) -> usize {
        self.expire_seen_orders_at(Utc::now()).await
    }

    pub async fn expire_seen_orders_at(&self, now: DateTime<Utc>) -> usize {
        let mut ledger = self.ledger.lock().await;
        let removed = match ledger
            .expire_older_than(now.timestamp_millis(), self.config.retention_ms())
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                error!(error = %e, "Error saving seen orders after cleanup");
                0
            }
        };
        self.metrics.seen_orders.set(ledger.len() as i64);
        removed
    }
}
