//! Prometheus metrics for enrichment-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// HTTP request counter by method, path, and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "enrichment_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register http_requests_total")
});

/// HTTP request duration histogram by method and path.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "enrichment_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register http_request_duration")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "enrichment_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Batch outcomes (completed, failed, skipped).
pub static BATCHES_PROCESSED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "enrichment_batches_processed_total",
        "Total number of batch processing outcomes",
        &["outcome"]
    )
    .expect("Failed to register batches_processed")
});

/// Transactions enriched, by resulting category source (matched, other).
pub static TRANSACTIONS_ENRICHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "enrichment_transactions_enriched_total",
        "Total number of transactions enriched",
        &["result"]
    )
    .expect("Failed to register transactions_enriched")
});

/// Cache lookups by cache name (patterns, summary) and result (hit, miss, error).
pub static CACHE_LOOKUPS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "enrichment_cache_lookups_total",
        "Total number of cache lookups",
        &["cache", "result"]
    )
    .expect("Failed to register cache_lookups")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&BATCHES_PROCESSED);
    Lazy::force(&TRANSACTIONS_ENRICHED);
    Lazy::force(&CACHE_LOOKUPS);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
