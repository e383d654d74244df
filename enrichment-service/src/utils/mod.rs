//! Validation helpers for the reporting boundary.

use crate::error::AppError;
use chrono::NaiveDate;

/// Longest reportable window, inclusive of both endpoints.
pub const MAX_RANGE_DAYS: i64 = 365;

/// Parse and validate a summary date range. Rejects malformed dates,
/// inverted ranges, and spans longer than [`MAX_RANGE_DAYS`] days; a span
/// of exactly 365 days is accepted.
pub fn validate_date_range(
    start_date: &str,
    end_date: &str,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!(
            "start_date must be in YYYY-MM-DD format"
        ))
    })?;

    let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!("end_date must be in YYYY-MM-DD format"))
    })?;

    if end < start {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "end_date must be greater than or equal to start_date"
        )));
    }

    let span_days = (end - start).num_days();
    if span_days > MAX_RANGE_DAYS {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Date range exceeds maximum of {} days (provided: {} days)",
            MAX_RANGE_DAYS,
            span_days
        )));
    }

    Ok((start, end))
}
