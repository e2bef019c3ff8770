use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::error::StoreError;
use crate::worker::PoolSample;

/// Consumes pool samples from the ingestion channel and writes them
/// through the store: config upsert first, then the transactional
/// observation + rolling-stat update.
///
/// Failed samples are logged and dropped; retrying transient failures
/// is the ingestion collaborator's responsibility, not the store's.
/// Samples for different pools are independent, so a single worker per
/// channel is enough to satisfy per-pool ordering; the row lock inside
/// `record_observation` protects against other writers.
pub struct IngestWorker {
    db: Arc<Database>,
    rx: mpsc::Receiver<PoolSample>,
}

impl IngestWorker {
    pub fn new(db: Arc<Database>, rx: mpsc::Receiver<PoolSample>) -> Self {
        Self { db, rx }
    }

    /// Runs until the channel closes or cancellation is requested.
    pub async fn run(mut self, cancellation_token: CancellationToken) {
        let mut accepted: u64 = 0;
        let mut rejected: u64 = 0;

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Ingest worker received cancellation");
                    break;
                },
                sample = self.rx.recv() => {
                    let Some(sample) = sample else {
                        info!("Ingest channel closed");
                        break;
                    };
                    match self.handle(sample).await {
                        Ok(()) => accepted += 1,
                        Err(_) => rejected += 1,
                    }
                },
            }
        }

        info!("Ingest worker stopped ({accepted} accepted, {rejected} rejected)");
    }

    async fn handle(&self, sample: PoolSample) -> Result<(), StoreError> {
        let pool = sample.pool.clone();
        let (config, observation) = sample.into_parts();

        let config_id = self.db.postgres.upsert_config(&config).await?;

        match self
            .db
            .postgres
            .record_observation(config_id, &observation)
            .await
        {
            Ok(stat) => {
                debug!(
                    "Recorded observation for pool {} (count={}, mean_apy={:.4})",
                    pool, stat.count, stat.mean_apy
                );
                Ok(())
            },
            Err(e @ StoreError::InvalidInput(_)) => {
                warn!("Rejected observation for pool {}: {}", pool, e);
                Err(e)
            },
            Err(e) => {
                error!("Failed to record observation for pool {}: {}", pool, e);
                Err(e)
            },
        }
    }
}
