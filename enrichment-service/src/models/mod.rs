//! Domain models for enrichment-service.

pub mod account;
pub mod batch;
pub mod category;
pub mod status;
pub mod transaction;

pub use account::{Account, UpsertAccount};
pub use batch::{Batch, SweepOutcome};
pub use category::{Category, CategoryPattern};
pub use status::Status;
pub use transaction::{EnrichedTransaction, NewTransaction, Transaction};
