pub mod client;
pub mod notification;

pub use client::{MessageQueue, QueueError, ReceivedMessage, SqsQueue, MAX_WAIT_SECONDS};
pub use notification::{
    decode, BatchReference, DecodeError, Notification, QueueNotification, VALIDATION_MESSAGE,
};
