pub mod ack;
pub mod retry;
pub mod runner;

pub use ack::{AckError, AckOutcome, Acknowledger};
pub use retry::{ExponentialBackoff, FixedDelay, RetryPolicy};
pub use runner::{IngestError, IngestionLoop, Iteration};
