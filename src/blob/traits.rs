use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Read a whole object into memory.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError>;

    /// List object keys in a bucket, optionally under a prefix.
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("S3 error for bucket {bucket}: {source}")]
    Store {
        bucket: String,
        #[source]
        source: object_store::Error,
    },
}
