//! Prometheus metrics for the tracker
//!
//! Kept in a tracker-owned registry rather than the global default one so
//! tests can build as many trackers as they like.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::error::{Result, TrackerError};

pub struct Metrics {
    registry: Registry,
    pub cycles: IntCounter,
    pub cycle_failures: IntCounter,
    pub orders_evaluated: IntCounter,
    pub alerts: IntCounter,
    pub alert_failures: IntCounter,
    pub seen_orders: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let cycles = IntCounter::new("tracker_cycles_total", "Polling cycles started")?;
        let cycle_failures = IntCounter::new(
            "tracker_cycle_failures_total",
            "Polling cycles that ended early because orders could not be fetched",
        )?;
        let orders_evaluated =
            IntCounter::new("tracker_orders_evaluated_total", "Orders normalized and valued")?;
        let alerts = IntCounter::new("tracker_alerts_total", "Large-order alerts raised")?;
        let alert_failures = IntCounter::new(
            "tracker_alert_failures_total",
            "Alerts whose notification could not be delivered",
        )?;
        let seen_orders = IntGauge::new("tracker_seen_orders", "Entries in the seen-order ledger")?;

        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(cycle_failures.clone()))?;
        registry.register(Box::new(orders_evaluated.clone()))?;
        registry.register(Box::new(alerts.clone()))?;
        registry.register(Box::new(alert_failures.clone()))?;
        registry.register(Box::new(seen_orders.clone()))?;

        Ok(Self {
            registry,
            cycles,
            cycle_failures,
            orders_evaluated,
            alerts,
            alert_failures,
            seen_orders,
        })
    }

    /// Prometheus text exposition of every tracker metric
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TrackerError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.alerts.inc();
        metrics.seen_orders.set(3);

        let text = metrics.encode().unwrap();
        assert!(text.contains("tracker_alerts_total 1"));
        assert!(text.contains("tracker_seen_orders 3"));
    }
}
