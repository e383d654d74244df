//! Batch status and manual re-triggering.

use crate::error::AppError;
use crate::startup::AppState;
use crate::workers::ProcessOutcome;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// `GET /api/batches/{batch_id}`
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let batch = state
        .db
        .get_batch(batch_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Batch {} not found", batch_id)))?;
    Ok(Json(batch))
}

/// `POST /api/batches/{batch_id}/process`
///
/// Synchronous single-batch trigger. Intended for operators re-driving a
/// `failed` batch; running batches report as skipped, not re-processed.
pub async fn process_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.processor.process_batch(batch_id).await?;

    let body = match outcome {
        ProcessOutcome::Enriched(count) => json!({
            "batch_id": batch_id,
            "result": "completed",
            "transactions_enriched": count,
        }),
        ProcessOutcome::Skipped(status) => json!({
            "batch_id": batch_id,
            "result": "skipped",
            "status": status.as_str(),
        }),
    };

    Ok(Json(body))
}
