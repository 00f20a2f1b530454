//! Decoding of CloudTrail notifications delivered through SNS into SQS.
//!
//! A queue message body is an SNS envelope whose `Message` field is itself a
//! JSON string naming the S3 object that holds the new log file:
//!
//! ```text
//! {"Type":"Notification","MessageId":"...","Message":"{\"s3Bucket\":\"b\",\"s3ObjectKey\":[\"k\"]}"}
//! ```
//!
//! When a trail is first pointed at a topic, CloudTrail publishes a plain text
//! validation message instead. That one is acknowledged and dropped.

use super::client::ReceivedMessage;
use serde::Deserialize;
use thiserror::Error;

/// Body CloudTrail publishes to confirm a topic subscription.
pub const VALIDATION_MESSAGE: &str = "CloudTrail validation message.";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("outer JSON decode error [id: {message_id}]: {source}")]
    Envelope {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("inner JSON decode error [id: {message_id}]: {source}")]
    Payload {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected one S3 key but got {count} [id: {message_id}]")]
    KeyCount { message_id: String, count: usize },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "MessageId", default)]
    message_id: Option<String>,
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(rename = "s3Bucket")]
    bucket: String,
    #[serde(rename = "s3ObjectKey", default)]
    object_keys: Vec<String>,
}

/// The outer envelope of one delivery, with the handle needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueNotification {
    pub message_id: String,
    pub message: String,
    pub receipt_handle: String,
}

/// A decoded pointer to one log file in S3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReference {
    pub bucket: String,
    pub object_keys: Vec<String>,
    pub message_id: String,
    pub receipt_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Batch(BatchReference),
    Handshake {
        message_id: String,
        receipt_handle: String,
    },
}

impl QueueNotification {
    /// Decode the SNS envelope.
    ///
    /// The envelope's `MessageId` wins; messages enqueued directly (backfill)
    /// carry none and fall back to the SQS message id.
    pub fn from_message(message: &ReceivedMessage) -> Result<Self, DecodeError> {
        let fallback_id = message.message_id.clone().unwrap_or_default();
        let envelope: Envelope =
            serde_json::from_str(&message.body).map_err(|source| DecodeError::Envelope {
                message_id: fallback_id.clone(),
                source,
            })?;

        Ok(Self {
            message_id: envelope
                .message_id
                .filter(|id| !id.is_empty())
                .unwrap_or(fallback_id),
            message: envelope.message,
            receipt_handle: message.receipt_handle.clone(),
        })
    }

    /// Decode the embedded payload.
    pub fn into_notification(self) -> Result<Notification, DecodeError> {
        if self.message == VALIDATION_MESSAGE {
            return Ok(Notification::Handshake {
                message_id: self.message_id,
                receipt_handle: self.receipt_handle,
            });
        }

        let payload: Payload =
            serde_json::from_str(&self.message).map_err(|source| DecodeError::Payload {
                message_id: self.message_id.clone(),
                source,
            })?;

        Ok(Notification::Batch(BatchReference {
            bucket: payload.bucket,
            object_keys: payload.object_keys,
            message_id: self.message_id,
            receipt_handle: self.receipt_handle,
        }))
    }
}

/// Decode one raw queue message in both layers.
pub fn decode(message: &ReceivedMessage) -> Result<Notification, DecodeError> {
    QueueNotification::from_message(message)?.into_notification()
}

impl Notification {
    pub fn message_id(&self) -> &str {
        match self {
            Notification::Batch(reference) => &reference.message_id,
            Notification::Handshake { message_id, .. } => message_id,
        }
    }

    pub fn receipt_handle(&self) -> &str {
        match self {
            Notification::Batch(reference) => &reference.receipt_handle,
            Notification::Handshake { receipt_handle, .. } => receipt_handle,
        }
    }
}

impl BatchReference {
    /// The one object key this notification points at.
    ///
    /// CloudTrail always names a single file; anything else is refused before
    /// the fetch.
    pub fn single_key(&self) -> Result<&str, DecodeError> {
        match self.object_keys.as_slice() {
            [key] => Ok(key.as_str()),
            keys => Err(DecodeError::KeyCount {
                message_id: self.message_id.clone(),
                count: keys.len(),
            }),
        }
    }

    /// `s3://bucket/key` for log lines.
    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.object_keys.join(","))
    }
}
