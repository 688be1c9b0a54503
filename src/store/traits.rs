use crate::pipeline::batch::Batch;
use async_trait::async_trait;
use std::fmt;

/// Destination of synthetic documents.
///
/// `bulk_write` inserts every document of the batch as a new record
/// (create-only). Documents the store rejects are reported in
/// [`BulkOutcome::errors`] and are not an `Err`; an `Err` means the call as a
/// whole failed.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Cluster identity, used to verify connectivity before a run
    async fn info(&self) -> Result<ClusterInfo, StoreError>;

    async fn bulk_write(&self, batch: &Batch) -> Result<BulkOutcome, StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub errors: Vec<BulkItemError>,
}

impl BulkOutcome {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One document rejected by the store
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemError {
    pub status: u16,
    pub error_type: String,
    pub reason: String,
}

impl fmt::Display for BulkItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.error_type, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid store endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: usize, last_error: String },

    #[error("store error: {0}")]
    Generic(String),
}
