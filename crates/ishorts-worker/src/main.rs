//! Pipeline worker binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ishorts_llm::OpenAiClient;
use ishorts_queue::{QueueBackend, RedisQueue, ALL_QUEUES};
use ishorts_store::PgStore;
use ishorts_worker::{metrics, register_stages, Processor, StageContext, WorkerConfig};

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ishorts_worker=info,sqlx=warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Ok(addr) = std::env::var("METRICS_ADDR") {
        let addr: SocketAddr = addr.parse().context("invalid METRICS_ADDR")?;
        metrics::init_metrics(addr).context("failed to start metrics exporter")?;
        info!(%addr, "Serving Prometheus metrics");
    }

    let queue = RedisQueue::from_env().context("failed to create queue client")?;
    if let Err(e) = queue.ping().await {
        warn!("Redis not reachable yet: {}", e);
    }
    let store = PgStore::from_env().await.context("failed to connect to database")?;
    let generator = OpenAiClient::from_env().context("failed to create generation client")?;

    let backend: Arc<dyn QueueBackend> = Arc::new(queue);
    let mut processor = Processor::new(backend, config.processor.clone());
    let ctx = StageContext::new(
        Arc::new(store),
        Arc::new(generator),
        processor.enqueuer(),
        config.stages.clone(),
    );
    register_stages(&mut processor, ctx);
    let processor = Arc::new(processor);

    let signal_processor = Arc::clone(&processor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_processor.shutdown();
    });

    processor.listen(&ALL_QUEUES).await?;
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

    info!("Starting ishorts-worker");

    if let Err(e) = run().await {
        error!("Worker error: {:#}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
