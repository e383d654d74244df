//! Service layer: persistence, caching, categorization, enrichment, metrics.

pub mod cache;
pub mod categorization;
pub mod database;
pub mod enrichment;
pub mod metrics;

pub use cache::{CacheStore, InMemoryCache, RedisCache};
pub use categorization::{PatternCategorizer, PatternSource, TransactionCategorizer};
pub use database::{BatchClaim, Database};
pub use enrichment::EnrichmentService;
pub use metrics::{get_metrics, init_metrics};
