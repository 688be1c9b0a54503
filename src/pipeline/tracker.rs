use crate::pipeline::channel::Receiver;
use crate::pipeline::dispatch::{Completion, Dispatch};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};

/// Running totals over resolved dispatches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub submitted: u64,
    pub resolved: u64,
    pub documents_written: u64,
    pub documents_rejected: u64,
    pub transport_failures: u64,
    pub peak_in_flight: usize,
    pub max_latency: Duration,
}

/// Owns every unresolved [`Dispatch`] and folds completions into the totals.
///
/// Each dispatch is counted exactly once: a completion for an id that is
/// not outstanding is ignored.
pub struct CompletionTracker {
    completions: Receiver<Completion>,
    in_flight: HashMap<u64, Dispatch>,
    stats: TrackerStats,
}

impl CompletionTracker {
    pub fn new(completions: Receiver<Completion>) -> Self {
        Self {
            completions,
            in_flight: HashMap::new(),
            stats: TrackerStats::default(),
        }
    }

    pub fn track(&mut self, dispatch: Dispatch) {
        self.in_flight.insert(dispatch.id, dispatch);
        self.stats.submitted += 1;
        self.stats.peak_in_flight = self.stats.peak_in_flight.max(self.in_flight.len());
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    pub fn documents_written(&self) -> u64 {
        self.stats.documents_written
    }

    /// Fold one completion into the totals. Returns false for a completion
    /// whose dispatch is unknown or already resolved.
    pub fn record(&mut self, completion: Completion) -> bool {
        if self.in_flight.remove(&completion.dispatch_id).is_none() {
            warn!(
                dispatch_id = completion.dispatch_id,
                "Completion for unknown dispatch ignored"
            );
            return false;
        }

        self.stats.resolved += 1;
        self.stats.documents_written += completion.success_count as u64;
        self.stats.documents_rejected += completion.errors.len() as u64;
        if completion.transport_failed {
            self.stats.transport_failures += 1;
        }
        self.stats.max_latency = self.stats.max_latency.max(completion.latency);
        true
    }

    /// Record every completion that is already available without waiting.
    /// Returns how many were recorded.
    pub fn poll(&mut self) -> usize {
        let mut recorded = 0;
        loop {
            match self.completions.try_recv() {
                Ok(completion) => {
                    if self.record(completion) {
                        recorded += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        recorded
    }

    /// Wait for the next completion. `None` once every worker has gone.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions.recv().await
    }

    /// Block until every outstanding dispatch has resolved, so the totals
    /// are final rather than a snapshot.
    pub async fn drain(&mut self) -> TrackerStats {
        while !self.in_flight.is_empty() {
            match self.completions.recv().await {
                Some(completion) => {
                    self.record(completion);
                }
                None => {
                    warn!(
                        outstanding = self.in_flight.len(),
                        "Workers stopped with dispatches unresolved"
                    );
                    break;
                }
            }
        }

        debug!(
            resolved = self.stats.resolved,
            written = self.stats.documents_written,
            "Completion tracker drained"
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::create_channel;
    use crate::store::traits::BulkItemError;
    use tokio::time::Instant;
    use uuid::Uuid;

    fn dispatch(id: u64, documents: usize) -> Dispatch {
        Dispatch {
            id,
            batch_id: Uuid::new_v4(),
            documents,
            submitted_at: Instant::now(),
        }
    }

    fn completion(id: u64, success_count: usize, rejected: usize) -> Completion {
        Completion {
            dispatch_id: id,
            success_count,
            errors: (0..rejected)
                .map(|_| BulkItemError {
                    status: 409,
                    error_type: "conflict".to_string(),
                    reason: String::new(),
                })
                .collect(),
            transport_failed: false,
            latency: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_poll_does_not_block_and_counts() {
        let (tx, rx) = create_channel();
        let mut tracker = CompletionTracker::new(rx);
        tracker.track(dispatch(0, 10));
        tracker.track(dispatch(1, 10));

        assert_eq!(tracker.poll(), 0);

        tx.send(completion(0, 8, 2)).unwrap();
        assert_eq!(tracker.poll(), 1);
        assert_eq!(tracker.in_flight(), 1);

        let stats = tracker.stats();
        assert_eq!(stats.documents_written, 8);
        assert_eq!(stats.documents_rejected, 2);
        assert_eq!(stats.peak_in_flight, 2);
    }

    #[test]
    fn test_duplicate_completion_not_double_counted() {
        let (tx, rx) = create_channel();
        let mut tracker = CompletionTracker::new(rx);
        tracker.track(dispatch(7, 5));

        tx.send(completion(7, 5, 0)).unwrap();
        tx.send(completion(7, 5, 0)).unwrap();
        tx.send(completion(99, 5, 0)).unwrap();

        assert_eq!(tracker.poll(), 1);
        assert_eq!(tracker.documents_written(), 5);
        assert_eq!(tracker.stats().resolved, 1);
    }

    #[test]
    fn test_transport_failures_counted() {
        let (tx, rx) = create_channel();
        let mut tracker = CompletionTracker::new(rx);
        tracker.track(dispatch(0, 5));

        let mut failed = completion(0, 0, 0);
        failed.transport_failed = true;
        tx.send(failed).unwrap();
        tracker.poll();

        assert_eq!(tracker.stats().transport_failures, 1);
        assert_eq!(tracker.documents_written(), 0);
    }

    #[tokio::test]
    async fn test_drain_waits_for_outstanding() {
        let (tx, rx) = create_channel();
        let mut tracker = CompletionTracker::new(rx);
        for id in 0..3 {
            tracker.track(dispatch(id, 4));
        }

        let producer = tokio::spawn(async move {
            for id in (0..3).rev() {
                tokio::time::sleep(Duration::from_millis(20)).await;
                tx.send(completion(id, 4, 0)).unwrap();
            }
        });

        let stats = tracker.drain().await;
        assert_eq!(stats.documents_written, 12);
        assert_eq!(tracker.in_flight(), 0);
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_stops_when_workers_gone() {
        let (tx, rx) = create_channel::<Completion>();
        let mut tracker = CompletionTracker::new(rx);
        tracker.track(dispatch(0, 4));
        drop(tx);

        let stats = tracker.drain().await;
        assert_eq!(stats.resolved, 0);
        assert_eq!(tracker.in_flight(), 1);
    }
}
