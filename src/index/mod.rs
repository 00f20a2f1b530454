pub mod bulk;
pub mod elasticsearch;

pub use bulk::{build_bulk_body, inspect_response, BulkFailures, INDEX_PATH};
pub use elasticsearch::ElasticsearchIndex;

use crate::trail::LogRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to encode bulk body: {0}")]
    Encode(serde_json::Error),

    #[error("error response from Elasticsearch: {status} {body}")]
    Rejected { status: u16, body: String },

    #[error("unreadable bulk response: {0}")]
    MalformedResponse(serde_json::Error),
}

/// A 200 bulk response that still reported failed documents.
#[derive(Debug, Error)]
#[error("{failed} of {total} documents failed to index (first: {})", .first_reason.as_deref().unwrap_or("unknown"))]
pub struct PartialLoadError {
    pub failed: usize,
    pub total: usize,
    pub first_reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    PartialLoad(#[from] PartialLoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub indexed: usize,
}

#[async_trait]
pub trait IndexSink: Send + Sync {
    /// Index a whole batch in one request. An empty batch succeeds without
    /// touching the network.
    async fn load(&self, records: &[LogRecord]) -> Result<LoadOutcome, IndexError>;
}
