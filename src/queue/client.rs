use crate::config::QueueConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::DisplayErrorContext;
use thiserror::Error;
use tracing::debug;

/// Longest long-poll SQS allows for a single receive.
pub const MAX_WAIT_SECONDS: i32 = 20;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("SQS ReceiveMessage error: {0}")]
    Receive(String),

    #[error("SQS DeleteMessage error: {0}")]
    Delete(String),

    #[error("SQS SendMessage error: {0}")]
    Send(String),

    #[error("message {0} has no receipt handle")]
    MissingReceiptHandle(String),
}

/// One message as delivered by the queue, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: Option<String>,
    pub body: String,
    pub receipt_handle: String,
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Long-poll for at most one message.
    async fn receive(&self) -> Result<Option<ReceivedMessage>, QueueError>;

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;

    async fn send(&self, body: &str) -> Result<(), QueueError>;
}

pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    /// Build a client from the standard AWS credential chain, pinned to the
    /// configured region.
    pub async fn connect(config: &QueueConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        Self {
            client: aws_sdk_sqs::Client::new(&shared),
            queue_url: config.url.clone(),
        }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive(&self) -> Result<Option<ReceivedMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(MAX_WAIT_SECONDS)
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(&e).to_string()))?;

        let messages = output.messages();
        if messages.len() > 1 {
            return Err(QueueError::Receive(format!(
                "expected 1 but got {} messages",
                messages.len()
            )));
        }

        let Some(message) = messages.first() else {
            return Ok(None);
        };

        let message_id = message.message_id().map(String::from);
        let receipt_handle = message.receipt_handle().ok_or_else(|| {
            QueueError::MissingReceiptHandle(message_id.clone().unwrap_or_default())
        })?;

        debug!(message_id = ?message_id, "Received SQS message");

        Ok(Some(ReceivedMessage {
            message_id,
            body: message.body().unwrap_or_default().to_string(),
            receipt_handle: receipt_handle.to_string(),
        }))
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn send(&self, body: &str) -> Result<(), QueueError> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Send(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}
