use super::traits::{FetchError, ObjectFetcher};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Fetches CloudTrail log files from S3.
///
/// Notifications can name any bucket, so one store is built lazily per bucket
/// and kept for later messages. Object bytes are never cached.
pub struct S3Fetcher {
    region: String,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3Fetcher {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            stores: Mutex::new(HashMap::new()),
        }
    }

    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, FetchError> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        // TODO: look up the bucket's own region instead of assuming the queue's
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&self.region)
            .build()
            .map_err(|source| FetchError::Store {
                bucket: bucket.to_string(),
                source,
            })?;

        debug!(bucket = %bucket, region = %self.region, "Created S3 client");

        let store: Arc<dyn ObjectStore> = Arc::new(store);
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

fn map_error(bucket: &str, key: &str, error: object_store::Error) -> FetchError {
    match error {
        object_store::Error::NotFound { .. } => FetchError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        source => FetchError::Store {
            bucket: bucket.to_string(),
            source,
        },
    }
}

#[async_trait]
impl ObjectFetcher for S3Fetcher {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        let store = self.store_for(bucket)?;
        let location = Path::from(key);

        let result = store
            .get(&location)
            .await
            .map_err(|e| map_error(bucket, key, e))?;

        result.bytes().await.map_err(|e| map_error(bucket, key, e))
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>, FetchError> {
        let store = self.store_for(bucket)?;
        let prefix = prefix.map(Path::from);

        let objects: Vec<_> = store
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(|source| FetchError::Store {
                bucket: bucket.to_string(),
                source,
            })?;

        Ok(objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        let err = map_error(
            "trail",
            "AWSLogs/a.json.gz",
            object_store::Error::NotFound {
                path: "AWSLogs/a.json.gz".to_string(),
                source: "missing".into(),
            },
        );
        assert!(matches!(err, FetchError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            "object s3://trail/AWSLogs/a.json.gz not found"
        );
    }

    #[test]
    fn test_other_errors_are_store_errors() {
        let err = map_error(
            "trail",
            "k",
            object_store::Error::Generic {
                store: "S3",
                source: "access denied".into(),
            },
        );
        assert!(matches!(err, FetchError::Store { .. }));
    }
}
