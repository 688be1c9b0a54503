use crate::pipeline::batch::Batch;
use crate::pipeline::channel::{create_channel, Receiver, Sender};
use crate::store::traits::{BulkItemError, IndexStore};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Rejected documents logged individually per batch
const ERROR_LOG_SAMPLE: usize = 3;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch pool has no running workers")]
    PoolClosed,
}

/// Handle for one submitted batch, resolved by a [`Completion`]
/// carrying the same `id`.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub id: u64,
    pub batch_id: Uuid,
    pub documents: usize,
    pub submitted_at: Instant,
}

/// Resolution of a [`Dispatch`].
#[derive(Debug, Clone)]
pub struct Completion {
    pub dispatch_id: u64,
    pub success_count: usize,
    pub errors: Vec<BulkItemError>,
    /// The bulk call as a whole failed; counts are zero
    pub transport_failed: bool,
    /// Time from submission to resolution, including queueing
    pub latency: Duration,
}

struct Job {
    dispatch: Dispatch,
    batch: Batch,
}

/// Fixed set of worker tasks performing bulk writes.
///
/// `submit` never waits: batches queue until a worker is free. Every
/// submitted batch produces exactly one [`Completion`] on the channel given
/// to [`DispatchPool::new`].
pub struct DispatchPool {
    jobs: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    next_id: u64,
}

impl DispatchPool {
    pub fn new(store: Arc<dyn IndexStore>, size: usize, completions: Sender<Completion>) -> Self {
        let (jobs, job_rx) = create_channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..size.max(1))
            .map(|worker_id| {
                let job_rx = Arc::clone(&job_rx);
                let store = Arc::clone(&store);
                let completions = completions.clone();
                tokio::spawn(async move {
                    run_worker(worker_id, job_rx, store, completions).await;
                })
            })
            .collect();

        Self {
            jobs,
            workers,
            next_id: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn submit(&mut self, batch: Batch) -> Result<Dispatch, DispatchError> {
        let dispatch = Dispatch {
            id: self.next_id,
            batch_id: batch.batch_id,
            documents: batch.len(),
            submitted_at: Instant::now(),
        };

        self.jobs
            .send(Job {
                dispatch: dispatch.clone(),
                batch,
            })
            .map_err(|_| DispatchError::PoolClosed)?;

        self.next_id += 1;
        Ok(dispatch)
    }

    /// Stop accepting batches. Workers finish everything already queued and
    /// then exit; the returned handles complete once they have.
    pub fn close(self) -> Vec<JoinHandle<()>> {
        drop(self.jobs);
        self.workers
    }
}

async fn run_worker(
    worker_id: usize,
    jobs: Arc<Mutex<Receiver<Job>>>,
    store: Arc<dyn IndexStore>,
    completions: Sender<Completion>,
) {
    loop {
        let job = {
            let mut rx = jobs.lock().await;
            rx.recv().await
        };

        let Some(Job { dispatch, batch }) = job else {
            debug!(worker_id, "Job queue closed, worker exiting");
            break;
        };

        let completion = execute(worker_id, store.as_ref(), &dispatch, batch).await;
        if completions.send(completion).is_err() {
            warn!(worker_id, "Completion receiver dropped, worker exiting");
            break;
        }
    }
}

async fn execute(
    worker_id: usize,
    store: &dyn IndexStore,
    dispatch: &Dispatch,
    batch: Batch,
) -> Completion {
    let result = store.bulk_write(&batch).await;
    let latency = dispatch.submitted_at.elapsed();

    match result {
        Ok(outcome) => {
            if !outcome.errors.is_empty() {
                for (i, item) in outcome.errors.iter().take(ERROR_LOG_SAMPLE).enumerate() {
                    error!(
                        batch_id = %batch.batch_id,
                        sample = i + 1,
                        error = %item,
                        "Document indexing error"
                    );
                }
                error!(
                    batch_id = %batch.batch_id,
                    failed = outcome.errors.len(),
                    succeeded = outcome.success_count,
                    "Bulk indexing failed for some documents"
                );
            }

            debug!(
                worker_id,
                dispatch_id = dispatch.id,
                succeeded = outcome.success_count,
                latency_ms = latency.as_millis(),
                "Bulk write completed"
            );

            Completion {
                dispatch_id: dispatch.id,
                success_count: outcome.success_count,
                errors: outcome.errors,
                transport_failed: false,
                latency,
            }
        }
        Err(e) => {
            error!(
                worker_id,
                batch_id = %batch.batch_id,
                documents = batch.len(),
                error = %e,
                "Bulk indexing exception"
            );

            Completion {
                dispatch_id: dispatch.id,
                success_count: 0,
                errors: Vec::new(),
                transport_failed: true,
                latency,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Synthesizer;
    use crate::pipeline::batch::BatchAssembler;
    use crate::store::traits::{BulkOutcome, ClusterInfo, StoreError};
    use async_trait::async_trait;

    struct HalfRejectingStore;

    #[async_trait]
    impl IndexStore for HalfRejectingStore {
        async fn info(&self) -> Result<ClusterInfo, StoreError> {
            Ok(ClusterInfo {
                cluster_name: "test".to_string(),
                version: "8.0.0".to_string(),
            })
        }

        async fn bulk_write(&self, batch: &Batch) -> Result<BulkOutcome, StoreError> {
            let rejected = batch.len() / 2;
            Ok(BulkOutcome {
                success_count: batch.len() - rejected,
                errors: (0..rejected)
                    .map(|_| BulkItemError {
                        status: 409,
                        error_type: "version_conflict_engine_exception".to_string(),
                        reason: "document already exists".to_string(),
                    })
                    .collect(),
            })
        }
    }

    struct DownStore;

    #[async_trait]
    impl IndexStore for DownStore {
        async fn info(&self) -> Result<ClusterInfo, StoreError> {
            Err(StoreError::Generic("down".to_string()))
        }

        async fn bulk_write(&self, _batch: &Batch) -> Result<BulkOutcome, StoreError> {
            Err(StoreError::Generic("connection refused".to_string()))
        }
    }

    fn assembler(size: usize) -> BatchAssembler {
        BatchAssembler::new(Arc::new(Synthesizer::default()), size)
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported() {
        let (tx, mut rx) = create_channel();
        let mut pool = DispatchPool::new(Arc::new(HalfRejectingStore), 2, tx);

        let dispatch = pool.submit(assembler(10).assemble()).unwrap();
        assert_eq!(dispatch.documents, 10);

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.dispatch_id, dispatch.id);
        assert_eq!(completion.success_count, 5);
        assert_eq!(completion.errors.len(), 5);
        assert!(!completion.transport_failed);
    }

    #[tokio::test]
    async fn test_transport_failure_resolves_to_zero() {
        let (tx, mut rx) = create_channel();
        let mut pool = DispatchPool::new(Arc::new(DownStore), 1, tx);

        pool.submit(assembler(5).assemble()).unwrap();
        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.success_count, 0);
        assert!(completion.errors.is_empty());
        assert!(completion.transport_failed);
    }

    #[tokio::test]
    async fn test_close_finishes_queued_jobs() {
        let (tx, mut rx) = create_channel();
        let mut pool = DispatchPool::new(Arc::new(HalfRejectingStore), 3, tx);
        assert_eq!(pool.size(), 3);

        let mut assembler = assembler(4);
        let ids: Vec<u64> = (0..20)
            .map(|_| pool.submit(assembler.assemble()).unwrap().id)
            .collect();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());

        for handle in pool.close() {
            handle.await.unwrap();
        }

        let mut resolved = 0;
        while let Some(completion) = rx.recv().await {
            assert_eq!(completion.success_count, 2);
            resolved += 1;
        }
        assert_eq!(resolved, 20);
    }
}
