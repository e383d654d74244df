//! Lifecycle status shared by batches and transactions.

use serde::{Deserialize, Serialize};

/// Processing status, stored as a lowercase string.
///
/// Batches move `pending -> processing -> {completed | failed}`; a batch in
/// `processing` or `completed` is never re-entered by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "processing" => Status::Processing,
            "completed" => Status::Completed,
            "failed" => Status::Failed,
            _ => Status::Pending,
        }
    }

    /// Terminal or in-flight states are not re-processed.
    pub fn is_reprocessable(&self) -> bool {
        matches!(self, Status::Pending | Status::Failed)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
