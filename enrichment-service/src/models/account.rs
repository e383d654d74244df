//! External financial account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Financial account keyed by its external identifier.
///
/// Re-ingesting an existing `account_id` overwrites the mutable fields; the
/// pipeline never deletes accounts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub name: String,
    pub account_type: String,
    pub subtype: Option<String>,
    pub mask: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for the ingestion upsert.
#[derive(Debug, Clone)]
pub struct UpsertAccount {
    pub account_id: String,
    pub name: String,
    pub account_type: String,
    pub subtype: Option<String>,
    pub mask: Option<String>,
}
