//! Production scheduler binary.
//!
//! Run exactly one instance per deployment.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ishorts_queue::{Enqueuer, RedisQueue};
use ishorts_scheduler::{ProductionScheduler, SchedulerConfig};
use ishorts_store::PgStore;

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ishorts_scheduler=info,sqlx=warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    let config = SchedulerConfig::from_env();
    info!("Scheduler config: {:?}", config);

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr: SocketAddr = addr.parse().context("invalid METRICS_ADDR")?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to start metrics exporter")?;
        info!(%addr, "Serving Prometheus metrics");
    }

    let queue = RedisQueue::from_env().context("failed to create queue client")?;
    queue.ping().await.context("Redis not reachable")?;
    let store = PgStore::from_env().await.context("failed to connect to database")?;

    let scheduler = ProductionScheduler::new(
        Arc::new(store),
        Enqueuer::new(Arc::new(queue)),
        config,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send_replace(true);
    });

    scheduler.run(shutdown_rx).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting ishorts-scheduler");

    if let Err(e) = run().await {
        error!("Scheduler error: {:#}", e);
        std::process::exit(1);
    }

    info!("Scheduler shutdown complete");
}
