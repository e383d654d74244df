//! Batch ingestion endpoint.

use crate::dtos::{IngestionRequest, IngestionResponse};
use crate::error::AppError;
use crate::models::{NewTransaction, UpsertAccount};
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

/// `POST /api/integrations/transactions`
///
/// Validates the payload, persists accounts + batch + transactions as one
/// atomic write, and schedules asynchronous processing for the new batch.
/// Duplicate `transaction_id`s are skipped silently; re-ingested accounts
/// are upserted.
pub async fn ingest_batch(
    State(state): State<AppState>,
    Json(payload): Json<IngestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| {
        tracing::warn!(error = %e, "Batch ingestion validation failed");
        AppError::ValidationError(e)
    })?;

    let accounts: Vec<UpsertAccount> = payload
        .accounts
        .iter()
        .map(|a| UpsertAccount {
            account_id: a.account_id.clone(),
            name: a.name.clone(),
            account_type: a.account_type.clone(),
            subtype: a.subtype.clone(),
            mask: a.mask.clone(),
        })
        .collect();

    let transactions: Vec<NewTransaction> = payload
        .transactions
        .iter()
        .map(|t| NewTransaction {
            transaction_id: t.transaction_id.clone(),
            account_id: t.account_id.clone(),
            amount: t.amount,
            currency: t.iso_currency_code.clone(),
            date: t.date,
            authorized_date: t.authorized_date,
            merchant_name: t.merchant_name.clone(),
            description: t.name.clone(),
            payment_channel: t.payment_channel.clone(),
            pending: t.pending,
        })
        .collect();

    let batch = state
        .db
        .ingest_batch(
            &accounts,
            &transactions,
            payload.total_transactions,
            payload.request_id.as_deref(),
        )
        .await?;

    // Trigger async processing. Enqueue failure is not fatal: the batch
    // stays pending and the sweep picks it up.
    if let Err(e) = state.queue.enqueue(batch.batch_id) {
        tracing::warn!(batch_id = %batch.batch_id, error = %e, "Failed to enqueue trigger");
    } else {
        tracing::info!(batch_id = %batch.batch_id, "Triggered async processing");
    }

    tracing::info!(
        batch_id = %batch.batch_id,
        total_transactions = batch.total_transactions,
        "Batch ingestion accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestionResponse {
            batch_id: batch.batch_id,
            total_transactions: batch.total_transactions,
        }),
    ))
}
