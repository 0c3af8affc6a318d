//! Hyperliquid Large-Order Tracker
//!
//! Watches an account's open orders and sends a Telegram alert, once per
//! order, whenever an order's USD value crosses the configured threshold.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hl_order_tracker::{
    diagnostics, notifier, schedule, AppState, Config, InfoClient, JsonFileStore, Metrics,
    OrderTracker, SeenOrderLedger,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting Hyperliquid order tracker");

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!(
        address = %config.target_address,
        threshold = %config.large_order_threshold,
        check_interval = ?config.check_interval,
        cleanup_schedule = ?config.cleanup_schedule,
        ledger = %config.seen_orders_path.display(),
        "Configuration loaded"
    );

    let client = Arc::new(InfoClient::new(&config.info_endpoint, config.http_timeout)?);
    let notifier = notifier::from_config(&config);
    let metrics = Arc::new(Metrics::new()?);

    let store = JsonFileStore::new(config.seen_orders_path.clone());
    let ledger = SeenOrderLedger::load(Box::new(store)).await;

    let tracker = Arc::new(OrderTracker::new(
        config.clone(),
        client.clone(),
        ledger,
        notifier.clone(),
        metrics.clone(),
    ));

    if config.send_startup_message {
        diagnostics::send_startup_message(notifier.as_ref()).await;
    }
    if config.test_telegram {
        diagnostics::test_connectivity(notifier.as_ref()).await;
    }
    if config.debug_mode {
        diagnostics::run_api_debug(&client).await;
    }

    // Start health check server
    let state = Arc::new(AppState {
        metrics: metrics.clone(),
        config: config.clone(),
    });
    tokio::spawn(async move {
        if let Err(e) = start_health_server(state).await {
            warn!(error = %e, "Health server error");
        }
    });

    // Polling cycles: one now, then on every tick of the check interval
    let poller = tracker.clone();
    let check_interval = config.check_interval;
    let polling = tokio::spawn(async move {
        poller.run_cycle().await;
        schedule::drive(check_interval, "poll", || {
            let tracker = poller.clone();
            async move {
                tracker.run_cycle().await;
            }
        })
        .await;
    });

    // Ledger expiry on its own, slower schedule
    let sweeper = tracker.clone();
    let cleanup_schedule = config.cleanup_schedule;
    let cleanup = tokio::spawn(async move {
        schedule::drive(cleanup_schedule, "cleanup", || {
            let tracker = sweeper.clone();
            async move {
                tracker.expire_seen_orders().await;
            }
        })
        .await;
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
        result = polling => error!(result = ?result, "Polling task exited"),
        result = cleanup => error!(result = ?result, "Cleanup task exited"),
    }

    info!("Order tracker stopped");
    Ok(())
}

/// Start HTTP server for health checks and metrics
async fn start_health_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.health_port));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %addr, "Starting health check server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "component": "hl-order-tracker",
        "address": state.config.target_address,
        "seen_orders": state.metrics.seen_orders.get(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, (StatusCode, String)> {
    state
        .metrics
        .encode()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
