use std::time::Duration;

/// Maps the number of consecutive failures (starting at 1) to how long the
/// ingestion loop pauses before polling again.
pub trait RetryPolicy: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> RetryPolicy for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// The same pause after every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self(delay)
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self(Duration::from_secs(5))
    }
}

impl RetryPolicy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Doubles the pause on every consecutive failure, up to a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |d| d.min(self.max))
    }
}
