//! Batch lifecycle processing.

use crate::error::AppError;
use crate::models::{EnrichedTransaction, Status, SweepOutcome};
use crate::services::database::BatchClaim;
use crate::services::enrichment::EnrichmentService;
use crate::services::metrics::BATCHES_PROCESSED;
use crate::services::Database;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Result of one `process_batch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Batch completed; carries the number of transactions enriched.
    Enriched(usize),
    /// Duplicate trigger: the batch was already in this state.
    Skipped(Status),
}

/// Drives a batch and its transactions through the lifecycle state
/// machine. Both the on-demand trigger and the periodic sweep funnel
/// through [`process_batch`](Self::process_batch); the row-level claim in
/// the database serializes concurrent runs for the same batch.
pub struct BatchProcessor {
    db: Arc<Database>,
    enrichment: EnrichmentService,
}

impl BatchProcessor {
    pub fn new(db: Arc<Database>, enrichment: EnrichmentService) -> Self {
        Self { db, enrichment }
    }

    /// Process a single batch by id.
    ///
    /// A batch already `processing` or `completed` is a no-op. Any failure
    /// after the claim marks the batch `failed` and propagates, so the
    /// caller's retry policy can decide.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub async fn process_batch(&self, batch_id: Uuid) -> Result<ProcessOutcome, AppError> {
        let batch = match self.db.claim_batch(batch_id).await? {
            BatchClaim::Claimed(batch) => batch,
            BatchClaim::AlreadyHandled(status) => {
                tracing::warn!(status = %status, "Batch already handled, skipping");
                BATCHES_PROCESSED.with_label_values(&["skipped"]).inc();
                return Ok(ProcessOutcome::Skipped(status));
            }
            BatchClaim::NotFound => {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Batch {} not found",
                    batch_id
                )));
            }
        };

        tracing::info!(
            total_transactions = batch.total_transactions,
            "Processing batch"
        );

        match self.enrich_batch(batch_id).await {
            Ok(count) => {
                BATCHES_PROCESSED.with_label_values(&["completed"]).inc();
                tracing::info!(enriched = count, "Batch completed");
                Ok(ProcessOutcome::Enriched(count))
            }
            Err(e) => {
                tracing::error!(error = %e, "Batch processing failed");
                BATCHES_PROCESSED.with_label_values(&["failed"]).inc();
                if let Err(mark_err) = self.db.mark_batch_failed(batch_id).await {
                    tracing::error!(error = %mark_err, "Failed to mark batch as failed");
                }
                Err(e)
            }
        }
    }

    /// Enrich every pending transaction of the batch and commit the
    /// results as one bulk write together with the `completed` transition.
    async fn enrich_batch(&self, batch_id: Uuid) -> Result<usize, AppError> {
        let pending = self.db.pending_transactions(batch_id).await?;

        tracing::info!(count = pending.len(), "Enriching pending transactions");

        let mut enriched = Vec::with_capacity(pending.len());
        for txn in &pending {
            let category = self
                .enrichment
                .enrich(txn.merchant_name.as_deref(), Some(&txn.description))
                .await?;
            enriched.push(EnrichedTransaction {
                transaction_id: txn.transaction_id.clone(),
                category,
            });
        }

        self.db.complete_batch(batch_id, &enriched).await?;

        Ok(enriched.len())
    }

    /// Process all pending batches, oldest first. A failing batch is
    /// counted and left `failed`; the sweep moves on to the next one.
    #[instrument(skip(self))]
    pub async fn run_sweep(&self) -> Result<SweepOutcome, AppError> {
        let pending = self.db.pending_batches().await?;

        if pending.is_empty() {
            tracing::debug!("No pending batches to process");
            return Ok(SweepOutcome::default());
        }

        tracing::info!(count = pending.len(), "Sweeping pending batches");

        let mut outcome = SweepOutcome::default();
        for batch in pending {
            match self.process_batch(batch.batch_id).await {
                Ok(ProcessOutcome::Enriched(_)) => outcome.processed += 1,
                // Another worker claimed it between the listing and the claim
                Ok(ProcessOutcome::Skipped(_)) => {}
                Err(e) => {
                    tracing::error!(batch_id = %batch.batch_id, error = %e, "Sweep batch failed");
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = outcome.processed,
            failed = outcome.failed,
            "Sweep finished"
        );

        Ok(outcome)
    }
}
