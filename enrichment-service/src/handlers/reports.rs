//! Account summary reporting endpoint.

use crate::dtos::{
    DateRange, ProcessingStatusBreakdown, SummaryMetrics, SummaryParams, SummaryResponse,
    TopCategory,
};
use crate::error::AppError;
use crate::services::database::{AccountMetricsRow, CategorySpendRow, StatusCountRow};
use crate::services::metrics::CACHE_LOOKUPS;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

/// Summary results are cached for this long; staleness within the window
/// is accepted by design.
const SUMMARY_CACHE_TTL_SECONDS: u64 = 300;

const TOP_CATEGORY_LIMIT: i64 = 3;

/// `GET /api/reports/accounts/{account_id}/summary?start_date&end_date`
///
/// Windowed metrics, top spending categories, and a processing-status
/// breakdown for one account. Dates are `YYYY-MM-DD`, the span at most
/// 365 days.
pub async fn account_summary(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, AppError> {
    let start_date = params.start_date.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "start_date is required (format: YYYY-MM-DD)"
        ))
    })?;
    let end_date = params.end_date.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "end_date is required (format: YYYY-MM-DD)"
        ))
    })?;

    let (start, end) = crate::utils::validate_date_range(&start_date, &end_date)?;

    let cache_key = format!("summary:{}:{}:{}", account_id, start, end);

    // A cache outage must not fail the request; fall through to a live
    // computation.
    match state.cache.get(&cache_key).await {
        Ok(Some(cached)) => match serde_json::from_str::<SummaryResponse>(&cached) {
            Ok(summary) => {
                CACHE_LOOKUPS.with_label_values(&["summary", "hit"]).inc();
                tracing::info!(account_id = %account_id, "Summary served from cache");
                return Ok(Json(summary));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable cached summary");
            }
        },
        Ok(None) => {
            CACHE_LOOKUPS.with_label_values(&["summary", "miss"]).inc();
        }
        Err(e) => {
            CACHE_LOOKUPS.with_label_values(&["summary", "error"]).inc();
            tracing::warn!(error = %e, "Summary cache unavailable, computing live");
        }
    }

    if !state.db.account_exists(&account_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Account not found")));
    }

    // Half-open query window covering [start 00:00:00, end 23:59:59.999999]
    let window_start = start.and_time(NaiveTime::MIN).and_utc();
    let window_end = (end + chrono::Duration::days(1))
        .and_time(NaiveTime::MIN)
        .and_utc();

    let metrics = state
        .db
        .account_metrics(&account_id, window_start, window_end)
        .await?;
    let categories = state
        .db
        .top_spend_categories(&account_id, window_start, window_end, TOP_CATEGORY_LIMIT)
        .await?;
    let statuses = state
        .db
        .status_breakdown(&account_id, window_start, window_end)
        .await?;

    let summary = build_summary(&account_id, start, end, metrics, categories, statuses);

    match serde_json::to_string(&summary) {
        Ok(encoded) => {
            if let Err(e) = state
                .cache
                .set(&cache_key, &encoded, SUMMARY_CACHE_TTL_SECONDS)
                .await
            {
                tracing::warn!(error = %e, "Failed to cache summary");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode summary for caching");
        }
    }

    tracing::info!(
        account_id = %account_id,
        start = %start,
        end = %end,
        total_transactions = summary.metrics.total_transactions,
        "Account summary generated"
    );

    Ok(Json(summary))
}

/// Shape raw aggregates into the response: spend becomes a positive
/// magnitude, net keeps the algebraic sign, category percentages are
/// shares of total spend (zero when there is no spend).
fn build_summary(
    account_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    metrics: AccountMetricsRow,
    categories: Vec<CategorySpendRow>,
    statuses: Vec<StatusCountRow>,
) -> SummaryResponse {
    let total_spend_signed = metrics.total_spend_signed;
    let total_spend = total_spend_signed.abs();
    let net = metrics.total_income + total_spend_signed;

    let hundred = Decimal::from(100);
    let top_categories = categories
        .into_iter()
        .map(|row| {
            let category_spend = row.total_spend_signed.abs();
            let percentage_of_spend = if total_spend.is_zero() {
                Decimal::ZERO
            } else {
                (category_spend / total_spend * hundred).round_dp(2)
            };
            TopCategory {
                category: row.category,
                total_spend: category_spend,
                transaction_count: row.transaction_count,
                percentage_of_spend,
            }
        })
        .collect();

    let mut processing_status = ProcessingStatusBreakdown::default();
    for row in statuses {
        match row.ingestion_status.as_str() {
            "pending" => processing_status.pending = row.count,
            "processing" => processing_status.processing = row.count,
            "completed" => processing_status.completed = row.count,
            "failed" => processing_status.failed = row.count,
            other => {
                tracing::warn!(status = other, "Unknown ingestion status in breakdown");
            }
        }
    }

    SummaryResponse {
        account_id: account_id.to_string(),
        date_range: DateRange { start, end },
        metrics: SummaryMetrics {
            total_transactions: metrics.total_transactions,
            total_spend,
            total_income: metrics.total_income,
            net,
        },
        top_categories,
        processing_status,
    }
}
