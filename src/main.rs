//! Repute worker - consumes governance events and updates reputation

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use repute::{
    config::Args,
    logging::{self, LogOutput},
    nats::NatsClient,
    services,
    worker::{Worker, WorkerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.core, LogOutput::Stdout);

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Repute - reputation event processor");
    info!("======================================");
    info!("Version: {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_COMMIT_SHORT"));
    info!("Built: {}", env!("BUILD_TIMESTAMP"));
    info!("Worker ID: {}", args.worker_id);
    info!("Mode: {}", if args.core.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("NATS: {}", args.nats.nats_url);
    info!("MongoDB: {} / {}", args.core.mongodb_uri, args.core.mongodb_db);
    for (network, url) in args.core.indexer_endpoints()? {
        info!("Indexer {}: {}", network, url);
    }
    info!("Concurrency: {}", args.max_concurrent);
    info!("======================================");

    let processor = services::build_processor(&args.core).await?;

    let nats = NatsClient::new(&args.nats, &format!("repute-{}", args.worker_id)).await?;

    let worker = Arc::new(Worker::new(
        WorkerConfig {
            worker_id: args.worker_id.to_string(),
            max_concurrent: args.max_concurrent,
            retry_delay: args.retry_delay(),
        },
        nats.jetstream(),
        processor,
    ));

    let mut worker_handle = tokio::spawn({
        let worker = worker.clone();
        async move {
            if let Err(e) = worker.run().await {
                error!("Worker error: {}", e);
            }
        }
    });

    let signalled = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            true
        }
        result = &mut worker_handle => {
            if let Err(e) = result {
                error!("Worker task error: {}", e);
            }
            false
        }
    };

    if signalled {
        info!("Draining current batch");
        worker.stop().await;
        if let Err(e) = worker_handle.await {
            error!("Worker task error: {}", e);
        }
    }

    info!("Worker shutting down");
    Ok(())
}
