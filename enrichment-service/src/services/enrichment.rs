//! Transaction enrichment: choosing the text to categorize and delegating.

use crate::error::AppError;
use crate::services::categorization::{TransactionCategorizer, FALLBACK_CATEGORY};
use crate::services::metrics::TRANSACTIONS_ENRICHED;
use std::sync::Arc;

/// Wraps a categorizer and picks the best-available transaction text:
/// merchant name first, description as the fallback.
#[derive(Clone)]
pub struct EnrichmentService {
    categorizer: Arc<dyn TransactionCategorizer>,
}

impl EnrichmentService {
    pub fn new(categorizer: Arc<dyn TransactionCategorizer>) -> Self {
        Self { categorizer }
    }

    /// Determine the category for a transaction. Returns the fallback
    /// category without invoking the categorizer when neither field has
    /// non-blank text.
    pub async fn enrich(
        &self,
        merchant_name: Option<&str>,
        description: Option<&str>,
    ) -> Result<String, AppError> {
        let text = merchant_name
            .filter(|s| !s.trim().is_empty())
            .or_else(|| description.filter(|s| !s.trim().is_empty()));

        let Some(text) = text else {
            tracing::debug!("No text available for categorization");
            TRANSACTIONS_ENRICHED.with_label_values(&["other"]).inc();
            return Ok(FALLBACK_CATEGORY.to_string());
        };

        let category = self.categorizer.categorize(text).await?;

        let result = if category == FALLBACK_CATEGORY {
            "other"
        } else {
            "matched"
        };
        TRANSACTIONS_ENRICHED.with_label_values(&[result]).inc();

        tracing::debug!(text = %text, category = %category, "Transaction categorized");

        Ok(category)
    }

    /// Forward invalidation to the categorizer.
    pub async fn invalidate(&self) -> Result<(), AppError> {
        self.categorizer.invalidate().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Stub that records the text it was asked to categorize.
    struct RecordingCategorizer {
        seen: std::sync::Mutex<Vec<String>>,
        reply: String,
    }

    impl RecordingCategorizer {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                seen: std::sync::Mutex::new(Vec::new()),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl TransactionCategorizer for RecordingCategorizer {
        async fn categorize(&self, text: &str) -> Result<String, AppError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(self.reply.clone())
        }

        async fn invalidate(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn merchant_name_takes_priority() {
        let stub = RecordingCategorizer::new("food");
        let service = EnrichmentService::new(stub.clone());

        let category = service
            .enrich(Some("Starbucks"), Some("coffee purchase"))
            .await
            .unwrap();

        assert_eq!(category, "food");
        assert_eq!(*stub.seen.lock().unwrap(), vec!["Starbucks"]);
    }

    #[tokio::test]
    async fn blank_merchant_falls_back_to_description() {
        let stub = RecordingCategorizer::new("food");
        let service = EnrichmentService::new(stub.clone());

        service
            .enrich(Some("   "), Some("coffee purchase"))
            .await
            .unwrap();

        assert_eq!(*stub.seen.lock().unwrap(), vec!["coffee purchase"]);
    }

    #[tokio::test]
    async fn no_text_skips_the_categorizer() {
        let stub = RecordingCategorizer::new("food");
        let service = EnrichmentService::new(stub.clone());

        let category = service.enrich(None, Some("  ")).await.unwrap();

        assert_eq!(category, FALLBACK_CATEGORY);
        assert!(stub.seen.lock().unwrap().is_empty());
    }
}
