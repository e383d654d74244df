//! Transaction categorization with pattern matching.

use crate::error::AppError;
use crate::services::cache::CacheStore;
use crate::services::database::Database;
use crate::services::metrics::CACHE_LOOKUPS;
use async_trait::async_trait;
use std::sync::Arc;

/// Category returned when no pattern matches.
pub const FALLBACK_CATEGORY: &str = "other";

/// Minimum length for both the input text and a usable pattern.
const MIN_LENGTH: usize = 3;

/// Snapshot cache key and TTL.
const CACHE_KEY: &str = "categorization:patterns";
const CACHE_TTL_SECONDS: u64 = 60;

/// Capability interface for turning free text into a category name.
/// Callers depend on this, not on the pattern implementation; tests inject
/// stubs.
#[async_trait]
pub trait TransactionCategorizer: Send + Sync {
    /// Categorize a merchant name or description. Returns the fallback
    /// category when nothing matches.
    async fn categorize(&self, text: &str) -> Result<String, AppError>;

    /// Drop any cached reference data so the next call observes current
    /// patterns. Must be called after every category or pattern write.
    async fn invalidate(&self) -> Result<(), AppError>;
}

/// Source of raw `(category_name, pattern)` pairs, ordered by category
/// name. Split out so the matcher can be tested without a database.
#[async_trait]
pub trait PatternSource: Send + Sync {
    async fn load_patterns(&self) -> Result<Vec<(String, String)>, AppError>;
}

#[async_trait]
impl PatternSource for Database {
    async fn load_patterns(&self) -> Result<Vec<(String, String)>, AppError> {
        self.list_category_patterns().await
    }
}

/// Normalized pattern snapshot: lowercased category names in stored order,
/// each with its usable patterns sorted longest-first.
type PatternSnapshot = Vec<(String, Vec<String>)>;

/// Pattern-backed categorizer.
///
/// Matching rules:
/// - input is lowercased and trimmed; empty or shorter than `MIN_LENGTH`
///   returns the fallback immediately
/// - categories are tried in stored (name) order, patterns within a
///   category longest-first
/// - a pattern matches when `pattern` is contained in the text OR the text
///   is contained in the pattern; the first match wins
///
/// The snapshot is served from the shared cache with a short TTL; writes to
/// the pattern store invalidate it explicitly.
pub struct PatternCategorizer<S: PatternSource> {
    source: S,
    cache: Arc<dyn CacheStore>,
}

impl<S: PatternSource> PatternCategorizer<S> {
    pub fn new(source: S, cache: Arc<dyn CacheStore>) -> Self {
        Self { source, cache }
    }

    fn build_snapshot(rows: Vec<(String, String)>) -> PatternSnapshot {
        let mut snapshot: PatternSnapshot = Vec::new();

        for (category, pattern) in rows {
            let category = category.to_lowercase();
            let pattern = pattern.to_lowercase().trim().to_string();
            if pattern.chars().count() < MIN_LENGTH {
                continue;
            }

            match snapshot.last_mut() {
                Some((name, patterns)) if *name == category => patterns.push(pattern),
                _ => snapshot.push((category, vec![pattern])),
            }
        }

        // Longest patterns first: more specific matches take priority
        for (_, patterns) in snapshot.iter_mut() {
            patterns.sort_by(|a, b| b.len().cmp(&a.len()));
        }

        snapshot
    }

    async fn load_snapshot(&self) -> Result<PatternSnapshot, AppError> {
        match self.cache.get(CACHE_KEY).await {
            Ok(Some(cached)) => match serde_json::from_str::<PatternSnapshot>(&cached) {
                Ok(snapshot) => {
                    CACHE_LOOKUPS.with_label_values(&["patterns", "hit"]).inc();
                    tracing::debug!("Loaded pattern snapshot from cache");
                    return Ok(snapshot);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding undecodable pattern snapshot");
                }
            },
            Ok(None) => {
                CACHE_LOOKUPS.with_label_values(&["patterns", "miss"]).inc();
            }
            Err(e) => {
                // Cache outage degrades to a live rebuild
                CACHE_LOOKUPS
                    .with_label_values(&["patterns", "error"])
                    .inc();
                tracing::warn!(error = %e, "Pattern cache unavailable, rebuilding from store");
            }
        }

        let snapshot = Self::build_snapshot(self.source.load_patterns().await?);

        let encoded = serde_json::to_string(&snapshot)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Snapshot encoding: {}", e)))?;
        if let Err(e) = self.cache.set(CACHE_KEY, &encoded, CACHE_TTL_SECONDS).await {
            tracing::warn!(error = %e, "Failed to cache pattern snapshot");
        }

        tracing::info!(categories = snapshot.len(), "Pattern snapshot rebuilt");

        Ok(snapshot)
    }
}

#[async_trait]
impl<S: PatternSource> TransactionCategorizer for PatternCategorizer<S> {
    async fn categorize(&self, text: &str) -> Result<String, AppError> {
        let text = text.to_lowercase();
        let text = text.trim();

        if text.chars().count() < MIN_LENGTH {
            tracing::debug!(text = %text, "Text too short for matching");
            return Ok(FALLBACK_CATEGORY.to_string());
        }

        let snapshot = self.load_snapshot().await?;

        for (category, patterns) in &snapshot {
            for pattern in patterns {
                // Bidirectional substring containment
                if text.contains(pattern.as_str()) || pattern.contains(text) {
                    tracing::debug!(
                        text = %text,
                        category = %category,
                        pattern = %pattern,
                        "Pattern matched"
                    );
                    return Ok(category.clone());
                }
            }
        }

        tracing::debug!(text = %text, "No pattern matched");
        Ok(FALLBACK_CATEGORY.to_string())
    }

    async fn invalidate(&self) -> Result<(), AppError> {
        self.cache
            .delete(CACHE_KEY)
            .await
            .map_err(AppError::InternalError)?;
        tracing::info!("Pattern snapshot invalidated");
        Ok(())
    }
}
