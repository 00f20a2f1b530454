use crate::blob::{FetchError, ObjectFetcher, S3Fetcher};
use crate::config::Config;
use crate::queue::{MessageQueue, QueueError, SqsQueue};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

/// Only compressed CloudTrail log files are queued.
pub const LOG_FILE_SUFFIX: &str = ".json.gz";

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("failed to list bucket: {0}")]
    List(#[from] FetchError),

    #[error("failed to queue {key}: {source}")]
    Enqueue {
        key: String,
        #[source]
        source: QueueError,
    },
}

/// Queue every log file already in `bucket` so the ingestion loop picks it
/// up like a fresh delivery.
pub async fn backfill(
    config: &Config,
    bucket: &str,
    prefix: Option<&str>,
) -> Result<usize, BackfillError> {
    let queue = SqsQueue::connect(&config.queue).await;
    let fetcher = S3Fetcher::new(config.queue.region.clone());

    let queued = enqueue_objects(&queue, &fetcher, bucket, prefix).await?;
    info!(bucket = %bucket, queued, "Backfill complete");
    Ok(queued)
}

pub async fn enqueue_objects(
    queue: &dyn MessageQueue,
    fetcher: &dyn ObjectFetcher,
    bucket: &str,
    prefix: Option<&str>,
) -> Result<usize, BackfillError> {
    let keys = fetcher.list(bucket, prefix).await?;

    let mut queued = 0;
    for key in keys.iter().filter(|k| k.ends_with(LOG_FILE_SUFFIX)) {
        queue
            .send(&backfill_message(bucket, key))
            .await
            .map_err(|source| BackfillError::Enqueue {
                key: key.clone(),
                source,
            })?;
        debug!(bucket = %bucket, key = %key, "Queued");
        queued += 1;
    }

    Ok(queued)
}

/// The same envelope CloudTrail delivers through SNS: the inner payload is a
/// JSON string inside `Message`.
pub fn backfill_message(bucket: &str, key: &str) -> String {
    let payload = json!({
        "s3Bucket": bucket,
        "s3ObjectKey": [key],
    });
    json!({ "Message": payload.to_string() }).to_string()
}
