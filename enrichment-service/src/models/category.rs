//! Categorization reference data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Named classification bucket.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub category_id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Text fragment matched against transaction text. Unique per
/// `(category_id, pattern)` pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CategoryPattern {
    pub pattern_id: Uuid,
    pub category_id: Uuid,
    pub pattern: String,
    pub created_utc: DateTime<Utc>,
}
