//! Periodic sweep of pending batches.

use crate::config::WorkerConfig;
use crate::workers::processor::BatchProcessor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Spawn the sweep loop. Ticks on a fixed period; a tick that overruns is
/// delayed rather than bursted, so sweeps never pile up. Overlap with
/// on-demand triggers is safe: both paths go through the batch claim.
pub fn spawn_sweep_scheduler(
    config: &WorkerConfig,
    processor: Arc<BatchProcessor>,
    shutdown: CancellationToken,
) {
    if !config.sweep_enabled {
        tracing::info!("Sweep scheduler disabled by configuration");
        return;
    }

    let period = Duration::from_secs(config.sweep_interval_seconds);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(period_secs = period.as_secs(), "Sweep scheduler started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Sweep scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match processor.run_sweep().await {
                        Ok(outcome) => {
                            if outcome.processed > 0 || outcome.failed > 0 {
                                tracing::info!(
                                    processed = outcome.processed,
                                    failed = outcome.failed,
                                    "Sweep pass complete"
                                );
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Sweep pass failed");
                        }
                    }
                }
            }
        }
    });
}
