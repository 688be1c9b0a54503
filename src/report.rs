use std::fmt;
use std::time::Duration;

/// Share of the target rate a run must reach to count as achieved
pub const TARGET_THRESHOLD: f64 = 0.9;

/// Final statistics of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub index: String,
    pub documents_written: u64,
    pub documents_rejected: u64,
    pub batches_submitted: u64,
    pub transport_failures: u64,
    pub target_rate: f64,
    pub elapsed: Duration,
    /// `None` for an infinite run
    pub configured_duration: Option<Duration>,
    pub peak_in_flight: usize,
    /// Slowest submission-to-resolution time of any batch
    pub max_latency: Duration,
    pub interrupted: bool,
}

impl RunSummary {
    /// Documents written per second of wall-clock time
    pub fn achieved_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.documents_written as f64 / secs
        } else {
            0.0
        }
    }

    /// Advisory only; a run below target still exits normally
    pub fn achieved_target(&self) -> bool {
        self.achieved_rate() >= self.target_rate * TARGET_THRESHOLD
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Summary ===")?;
        writeln!(f, "Index: {}", self.index)?;
        writeln!(f, "Documents indexed: {}", group_thousands(self.documents_written))?;
        if self.documents_rejected > 0 {
            writeln!(
                f,
                "Documents rejected: {}",
                group_thousands(self.documents_rejected)
            )?;
        }
        writeln!(f, "Batches submitted: {}", group_thousands(self.batches_submitted))?;
        if self.transport_failures > 0 {
            writeln!(f, "Failed bulk requests: {}", self.transport_failures)?;
        }
        writeln!(
            f,
            "Target rate: {} docs/sec",
            group_thousands(self.target_rate.round() as u64)
        )?;
        writeln!(f, "Actual rate: {:.1} docs/sec", self.achieved_rate())?;
        writeln!(f, "Elapsed: {:.2} seconds", self.elapsed.as_secs_f64())?;
        match self.configured_duration {
            Some(d) => writeln!(f, "Duration: {} seconds", d.as_secs())?,
            None => writeln!(f, "Duration: infinite")?,
        }
        writeln!(f, "Peak in-flight requests: {}", self.peak_in_flight)?;
        writeln!(f, "Slowest bulk request: {} ms", self.max_latency.as_millis())?;
        if self.interrupted {
            writeln!(f, "Run interrupted before completion")?;
        }

        if self.achieved_target() {
            write!(f, "✓ Target rate achieved!")
        } else {
            write!(
                f,
                "⚠ Target rate not fully achieved - consider adjusting batch size or threads"
            )
        }
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
