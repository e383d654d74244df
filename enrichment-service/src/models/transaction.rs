//! Financial transaction records.

use crate::models::Status;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One financial movement. `transaction_id` is the global dedup key:
/// duplicate ingestion attempts are skipped, never overwritten.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_id: String,
    pub account_id: String,
    pub batch_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub date: DateTime<Utc>,
    pub authorized_date: Option<NaiveDate>,
    pub merchant_name: Option<String>,
    pub description: String,
    pub payment_channel: Option<String>,
    pub pending: bool,
    pub category: Option<String>,
    pub ingestion_status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Transaction {
    pub fn parsed_status(&self) -> Status {
        Status::from_string(&self.ingestion_status)
    }
}

/// Input row for the ingestion bulk insert.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub account_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub date: DateTime<Utc>,
    pub authorized_date: Option<NaiveDate>,
    pub merchant_name: Option<String>,
    pub description: String,
    pub payment_channel: Option<String>,
    pub pending: bool,
}

/// Enrichment result for the bulk status flip.
#[derive(Debug, Clone)]
pub struct EnrichedTransaction {
    pub transaction_id: String,
    pub category: String,
}
