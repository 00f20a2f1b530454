use crate::queue::{MessageQueue, QueueError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("failed to delete message {message_id}: {source}")]
pub struct AckError {
    pub message_id: String,
    #[source]
    pub source: QueueError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Deleted,
    /// Persist mode: the message was left on the queue on purpose.
    Retained,
}

/// Deletes finished messages from the queue, unless persist mode keeps them
/// around for debugging.
pub struct Acknowledger {
    queue: Arc<dyn MessageQueue>,
    persist: bool,
}

impl Acknowledger {
    pub fn new(queue: Arc<dyn MessageQueue>, persist: bool) -> Self {
        Self { queue, persist }
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    pub async fn acknowledge(
        &self,
        message_id: &str,
        receipt_handle: &str,
    ) -> Result<AckOutcome, AckError> {
        if self.persist {
            debug!(message_id = %message_id, "NOT DELETING message (persist mode)");
            return Ok(AckOutcome::Retained);
        }

        self.queue
            .delete(receipt_handle)
            .await
            .map_err(|source| AckError {
                message_id: message_id.to_string(),
                source,
            })?;

        debug!(message_id = %message_id, "Deleted message");
        Ok(AckOutcome::Deleted)
    }
}
