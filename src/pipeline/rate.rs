use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Interval used when no sensible one can be derived from the rate
pub const FALLBACK_BATCH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq)]
pub enum RateError {
    #[error("target rate must be a positive number of docs/sec, got {0}")]
    InvalidRate(f64),

    #[error("batch size must be at least 1")]
    EmptyBatch,
}

/// Seconds between emissions for `batch_size` documents at `target_rate` docs/sec.
///
/// Never divides by zero: a non-positive or non-finite rate yields
/// [`FALLBACK_BATCH_INTERVAL`].
pub fn batch_interval(target_rate: f64, batch_size: usize) -> Duration {
    if !target_rate.is_finite() || target_rate <= 0.0 {
        return FALLBACK_BATCH_INTERVAL;
    }
    Duration::try_from_secs_f64(batch_size as f64 / target_rate).unwrap_or(FALLBACK_BATCH_INTERVAL)
}

/// Fixed-interval emission gate.
///
/// A batch is due once `batch_interval` has passed since the previous
/// emission. Missed intervals are not made up: a slow loop lowers the
/// achieved rate instead of producing a burst.
#[derive(Debug)]
pub struct RateController {
    batch_interval: Duration,
    last_emission: Option<Instant>,
}

impl RateController {
    pub fn new(target_rate: f64, batch_size: usize) -> Result<Self, RateError> {
        if !target_rate.is_finite() || target_rate <= 0.0 {
            return Err(RateError::InvalidRate(target_rate));
        }
        if batch_size == 0 {
            return Err(RateError::EmptyBatch);
        }

        Ok(Self {
            batch_interval: batch_interval(target_rate, batch_size),
            last_emission: None,
        })
    }

    pub fn batch_interval(&self) -> Duration {
        self.batch_interval
    }

    /// The first batch is due immediately.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_emission {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.batch_interval,
        }
    }

    pub fn mark_emitted(&mut self, now: Instant) {
        self.last_emission = Some(now);
    }

    /// Earliest instant at which the next batch may be emitted, `None` when
    /// that lies beyond what an `Instant` can represent.
    pub fn next_due(&self, now: Instant) -> Option<Instant> {
        match self.last_emission {
            None => Some(now),
            Some(last) => last.checked_add(self.batch_interval),
        }
    }
}
