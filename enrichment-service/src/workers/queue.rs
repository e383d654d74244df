//! In-process trigger queue for on-demand batch processing.

use crate::config::WorkerConfig;
use crate::error::AppError;
use crate::workers::processor::BatchProcessor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A queued processing trigger.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub batch_id: Uuid,
    pub enqueued_at: Instant,
}

/// Accepts batch ids and schedules asynchronous single-batch processing:
/// at-least-once within the process, a bounded number of attempts per
/// trigger, and an expiry after which a stale trigger is discarded instead
/// of executed late. Batches that exhaust their attempts stay `failed`
/// until the sweep or an operator intervenes.
pub struct ProcessingQueue {
    job_tx: mpsc::Sender<ProcessingJob>,
}

impl ProcessingQueue {
    /// Create the queue and spawn its consumer task.
    pub fn start(
        config: &WorkerConfig,
        processor: Arc<BatchProcessor>,
        shutdown: CancellationToken,
    ) -> Self {
        let (job_tx, mut job_rx) = mpsc::channel::<ProcessingJob>(config.queue_size);

        let expiry = Duration::from_secs(config.trigger_expiry_seconds);
        let max_attempts = config.max_attempts.max(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Trigger queue shutting down");
                        break;
                    }
                    job = job_rx.recv() => {
                        let Some(job) = job else {
                            tracing::info!("Trigger channel closed, consumer exiting");
                            break;
                        };

                        if job.enqueued_at.elapsed() > expiry {
                            tracing::warn!(
                                batch_id = %job.batch_id,
                                age_secs = job.enqueued_at.elapsed().as_secs(),
                                "Discarding expired trigger"
                            );
                            continue;
                        }

                        let processor = processor.clone();
                        tokio::spawn(async move {
                            run_with_retries(&processor, job.batch_id, max_attempts).await;
                        });
                    }
                }
            }
        });

        Self { job_tx }
    }

    /// Schedule processing for a batch. Fails only when the queue is full;
    /// the caller decides whether that is fatal (ingestion treats it as
    /// non-fatal and leaves the batch to the sweep).
    pub fn enqueue(&self, batch_id: Uuid) -> Result<(), AppError> {
        self.job_tx
            .try_send(ProcessingJob {
                batch_id,
                enqueued_at: Instant::now(),
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => {
                    AppError::InternalError(anyhow::anyhow!("Trigger queue full"))
                }
                TrySendError::Closed(_) => {
                    AppError::InternalError(anyhow::anyhow!("Trigger queue closed"))
                }
            })
    }
}

/// Run the single-batch routine with a bounded attempt count and a
/// doubling inter-attempt delay. A retried batch is claimable again
/// because failure leaves it in `failed`, not `processing`.
async fn run_with_retries(processor: &BatchProcessor, batch_id: Uuid, max_attempts: u32) {
    let mut delay = Duration::from_secs(1);

    for attempt in 1..=max_attempts {
        match processor.process_batch(batch_id).await {
            Ok(_) => return,
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    batch_id = %batch_id,
                    attempt = attempt,
                    error = %e,
                    "Batch processing attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                tracing::error!(
                    batch_id = %batch_id,
                    attempts = max_attempts,
                    error = %e,
                    "Batch processing failed, giving up"
                );
            }
        }
    }
}
