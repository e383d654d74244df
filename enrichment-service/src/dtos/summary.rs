//! Account summary report types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Query parameters for the summary endpoint. Both dates are required;
/// presence is checked in the handler so the error detail can name the
/// missing parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_transactions: i64,
    /// Positive magnitude of all negative amounts in the window.
    pub total_spend: Decimal,
    /// Sum of all non-negative amounts.
    pub total_income: Decimal,
    /// Algebraic sum: income plus signed spend.
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub category: String,
    pub total_spend: Decimal,
    pub transaction_count: i64,
    /// Share of total spend, percent, rounded to 2 decimal places; zero
    /// when there is no spend.
    pub percentage_of_spend: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStatusBreakdown {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub account_id: String,
    pub date_range: DateRange,
    pub metrics: SummaryMetrics,
    pub top_categories: Vec<TopCategory>,
    pub processing_status: ProcessingStatusBreakdown,
}
