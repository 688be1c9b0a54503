/// What the control loop does when dispatches are slower than emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureStrategy {
    /// Keep emitting on schedule; unresolved dispatches pile up in memory
    Accumulate,
    /// Skip emission while `max_in_flight` dispatches are unresolved
    Block { max_in_flight: usize },
}

/// Gate applied before each submission.
#[derive(Debug, Clone, Copy)]
pub struct BackpressureHandler {
    strategy: BackpressureStrategy,
}

impl BackpressureHandler {
    pub fn new(strategy: BackpressureStrategy) -> Self {
        Self { strategy }
    }

    /// Strategy for a configured in-flight limit, where 0 means unbounded
    pub fn from_limit(max_in_flight: usize) -> Self {
        match max_in_flight {
            0 => Self::new(BackpressureStrategy::Accumulate),
            limit => Self::new(BackpressureStrategy::Block {
                max_in_flight: limit,
            }),
        }
    }

    /// Whether another dispatch may be submitted with `in_flight` outstanding
    pub fn admits(&self, in_flight: usize) -> bool {
        match self.strategy {
            BackpressureStrategy::Accumulate => true,
            BackpressureStrategy::Block { max_in_flight } => in_flight < max_in_flight,
        }
    }

    pub fn strategy(&self) -> BackpressureStrategy {
        self.strategy
    }
}
