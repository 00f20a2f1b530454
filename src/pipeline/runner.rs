use super::ack::{AckError, AckOutcome, Acknowledger};
use super::retry::{FixedDelay, RetryPolicy};
use crate::blob::{FetchError, ObjectFetcher};
use crate::index::{IndexError, IndexSink, LoadError, PartialLoadError};
use crate::queue::{decode, DecodeError, MessageQueue, Notification, QueueError};
use crate::trail::{parse_batch, ParseError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Everything that can go wrong in one pass of the ingestion loop. None of
/// these stop the loop.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("error dequeuing from SQS: {0}")]
    Receive(#[from] QueueError),

    #[error("malformed notification: {0}")]
    MalformedNotification(#[from] DecodeError),

    #[error("error downloading from S3: {0}")]
    Fetch(#[from] FetchError),

    #[error("error parsing CloudTrail file: {0}")]
    Parse(#[from] ParseError),

    #[error("error uploading to Elasticsearch: {0}")]
    Load(#[from] LoadError),

    #[error("partial upload to Elasticsearch: {0}")]
    PartialLoad(#[from] PartialLoadError),

    #[error("error deleting from SQS queue: {0}")]
    Ack(#[from] AckError),
}

impl From<IndexError> for IngestError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::Load(e) => IngestError::Load(e),
            IndexError::PartialLoad(e) => IngestError::PartialLoad(e),
        }
    }
}

/// What a successful pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iteration {
    /// The long poll came back empty.
    Idle,
    /// A subscription validation message was acknowledged and dropped.
    Handshake { message_id: String },
    Indexed {
        message_id: String,
        records: usize,
        ack: AckOutcome,
    },
}

/// Pulls one notification at a time off the queue and carries its log file
/// through fetch, parse, index and acknowledge.
pub struct IngestionLoop {
    queue: Arc<dyn MessageQueue>,
    fetcher: Arc<dyn ObjectFetcher>,
    index: Arc<dyn IndexSink>,
    acknowledger: Acknowledger,
    retry: Arc<dyn RetryPolicy>,
}

impl IngestionLoop {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        fetcher: Arc<dyn ObjectFetcher>,
        index: Arc<dyn IndexSink>,
        persist: bool,
    ) -> Self {
        Self {
            acknowledger: Acknowledger::new(queue.clone(), persist),
            queue,
            fetcher,
            index,
            retry: Arc::new(FixedDelay::default()),
        }
    }

    pub fn with_retry_policy(mut self, retry: impl RetryPolicy + 'static) -> Self {
        self.retry = Arc::new(retry);
        self
    }

    /// Run one receive → decode → fetch → parse → load → acknowledge pass.
    ///
    /// The message is only acknowledged once the whole file is indexed; any
    /// earlier failure leaves it on the queue for redelivery.
    pub async fn run_once(&self) -> Result<Iteration, IngestError> {
        let Some(message) = self.queue.receive().await? else {
            return Ok(Iteration::Idle);
        };

        let reference = match decode(&message)? {
            Notification::Batch(reference) => reference,
            Notification::Handshake {
                message_id,
                receipt_handle,
            } => {
                info!(message_id = %message_id, "Received CloudTrail validation message");
                self.acknowledger
                    .acknowledge(&message_id, &receipt_handle)
                    .await?;
                return Ok(Iteration::Handshake { message_id });
            }
        };

        let key = reference.single_key()?;
        debug!(
            message_id = %reference.message_id,
            bucket = %reference.bucket,
            key = %key,
            "Fetched notification"
        );

        let bytes = self.fetcher.fetch(&reference.bucket, key).await?;
        let records = parse_batch(&bytes)?;
        debug!(
            message_id = %reference.message_id,
            location = %reference.location(),
            records = records.len(),
            "Downloaded records"
        );

        let outcome = self.index.load(&records).await?;
        debug!(
            message_id = %reference.message_id,
            location = %reference.location(),
            indexed = outcome.indexed,
            "Uploaded records"
        );

        let ack = self
            .acknowledger
            .acknowledge(&reference.message_id, &reference.receipt_handle)
            .await?;

        info!(
            message_id = %reference.message_id,
            records = records.len(),
            "Loaded CloudTrail file"
        );

        Ok(Iteration::Indexed {
            message_id: reference.message_id,
            records: records.len(),
            ack,
        })
    }

    /// Repeat [`run_once`](Self::run_once) until the task is aborted.
    ///
    /// A failed pass is logged and followed by a pause from the retry policy;
    /// a successful pass resets the failure count.
    pub async fn run(self) {
        info!(persist = self.acknowledger.persist(), "Ingestion loop started");

        let mut failures: u32 = 0;
        loop {
            match self.run_once().await {
                Ok(_) => failures = 0,
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = self.retry.delay(failures);
                    error!(
                        error = %e,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        "Ingestion failed, pausing"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
