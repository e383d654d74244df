//! Batch ingestion unit.

use crate::models::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One ingestion request, owning a set of transactions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: Uuid,
    pub request_id: Option<String>,
    pub total_transactions: i32,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Batch {
    pub fn parsed_status(&self) -> Status {
        Status::from_string(&self.status)
    }
}

/// Outcome of one sweep over pending batches.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepOutcome {
    pub processed: u32,
    pub failed: u32,
}
