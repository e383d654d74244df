//! Request/response types for the HTTP boundary.

pub mod categories;
pub mod ingestion;
pub mod summary;

pub use categories::{CreateCategoryRequest, CreatePatternRequest};
pub use ingestion::{IngestAccount, IngestTransaction, IngestionRequest, IngestionResponse};
pub use summary::{
    DateRange, ProcessingStatusBreakdown, SummaryMetrics, SummaryParams, SummaryResponse,
    TopCategory,
};
