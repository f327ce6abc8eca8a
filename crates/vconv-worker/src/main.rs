//! Upload conversion worker binary.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use vconv_store::{DatabaseConfig, InMemoryTaskStateStore, PgTaskStateStore, TaskStateStore};
use vconv_worker::{init_tracing, StoreBackend, TaskExecutor, TaskProcessor, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();
    info!("Starting vconv-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let store: Arc<dyn TaskStateStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env();
            info!(url = %db_config.redacted_url(), "Connecting to postgres");
            let store = PgTaskStateStore::connect(&db_config)
                .await
                .context("failed to connect to postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to create task state tables")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            info!("Using in-memory task state; nothing will be persisted");
            Arc::new(InMemoryTaskStateStore::new())
        }
    };

    let transcoder = Arc::new(config.ffmpeg_runner());
    let payload = config.task_payload.clone();
    let processor = TaskProcessor::new(config, store, transcoder);

    // Ctrl-C stops the executor before its next task
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    let executor = TaskExecutor::new(processor, shutdown_rx);
    executor.run([payload.into_bytes()]).await;

    info!("Worker shutdown complete");
    Ok(())
}
