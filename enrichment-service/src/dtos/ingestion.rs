//! Batch ingestion payload.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Account entry in the ingestion payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestAccount {
    #[validate(length(min = 1, max = 255, message = "account_id is required"))]
    pub account_id: String,

    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "type is required"))]
    #[serde(rename = "type")]
    pub account_type: String,

    #[validate(length(max = 100))]
    pub subtype: Option<String>,

    #[validate(length(max = 10))]
    pub mask: Option<String>,
}

/// Transaction entry in the ingestion payload. `name` carries the
/// description, matching the upstream provider's field naming.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestTransaction {
    #[validate(length(min = 1, max = 255, message = "transaction_id is required"))]
    pub transaction_id: String,

    #[validate(length(min = 1, max = 255, message = "account_id is required"))]
    pub account_id: String,

    pub amount: Decimal,

    #[validate(length(equal = 3, message = "iso_currency_code must be 3 characters"))]
    pub iso_currency_code: String,

    pub date: DateTime<Utc>,

    /// Accepts a calendar date or a full timestamp; the time component is
    /// discarded.
    #[serde(default, deserialize_with = "flexible_date")]
    pub authorized_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,

    #[validate(length(max = 255))]
    pub merchant_name: Option<String>,

    #[validate(length(max = 50))]
    pub payment_channel: Option<String>,

    #[serde(default)]
    pub pending: bool,
}

/// Full ingestion request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestionRequest {
    #[validate(nested)]
    pub accounts: Vec<IngestAccount>,

    #[validate(nested)]
    pub transactions: Vec<IngestTransaction>,

    #[validate(range(min = 0))]
    pub total_transactions: i32,

    #[validate(length(max = 255))]
    pub request_id: Option<String>,
}

/// Accepted-batch response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResponse {
    pub batch_id: Uuid,
    pub total_transactions: i32,
}

/// Deserialize a date given either as `YYYY-MM-DD` or as a timestamp,
/// keeping only the calendar date.
fn flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    let Some(value) = value else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
        return Ok(Some(dt.date_naive()));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(dt.date()));
    }

    Err(serde::de::Error::custom(format!(
        "invalid date '{}': expected YYYY-MM-DD or a timestamp",
        value
    )))
}
