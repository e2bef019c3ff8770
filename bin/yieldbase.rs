use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use jemallocator::Jemalloc;
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use yieldbase::{Database, IngestWorker, PoolSample, Settings};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings = Arc::new(
        Settings::new()
            .context("Failed to load config.yaml. Please ensure it exists and is valid")?,
    );

    // Connect and apply schema
    let db = Arc::new(
        Database::new(settings.clone())
            .await
            .context("Failed to initialize database connection")?,
    );

    let (sample_tx, sample_rx) = mpsc::channel::<PoolSample>(settings.ingest.queue_capacity);

    let cancellation_token = CancellationToken::new();

    // Spawn the ingest worker
    let worker = IngestWorker::new(db.clone(), sample_rx);
    let worker_token = cancellation_token.child_token();
    let worker_handle = tokio::spawn(async move {
        worker.run(worker_token).await;
    });

    // Feed NDJSON samples from stdin - the ingestion collaborator pipes
    // one JSON object per line. Dropping the sender on EOF closes the
    // channel and lets the worker drain and stop.
    let reader_token = cancellation_token.child_token();
    let reader_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = reader_token.cancelled() => break,
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            match serde_json::from_str::<PoolSample>(line) {
                                Ok(sample) => {
                                    if sample_tx.send(sample).await.is_err() {
                                        break;
                                    }
                                },
                                Err(e) => warn!("Skipping malformed sample line: {}", e),
                            }
                        },
                        Ok(None) => {
                            info!("End of input stream");
                            break;
                        },
                        Err(e) => {
                            error!("Failed to read input: {}", e);
                            break;
                        },
                    }
                },
            }
        }
        drop(sample_tx);
    });

    // Cancel everything on Ctrl+C / SIGTERM
    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm_stream = {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        return;
                    },
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
                },
                _ = sigterm_stream.recv() => {
                    info!("Received SIGTERM, exiting gracefully...");
                },
            };
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
        }

        signal_token.cancel();
    });

    info!("Yield store running. Press Ctrl+C to stop.");

    // The worker finishes when the input stream ends or on cancellation
    let _ = worker_handle.await;
    cancellation_token.cancel();
    let _ = reader_handle.await;

    // Close out the run with a cross-pool median snapshot
    match db.postgres.record_median_snapshot(Utc::now()).await {
        Ok(Some(snapshot)) => info!(
            "Recorded median snapshot: {} pools, median APY {:.4}",
            snapshot.unique_pools, snapshot.median_apy
        ),
        Ok(None) => {},
        Err(e) => error!("Failed to record median snapshot: {}", e),
    }

    info!("All tasks stopped");
    Ok(())
}
