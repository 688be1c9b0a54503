use crate::config::types::GeneratorConfig;
use crate::document::{SynthError, Synthesizer};
use crate::pipeline::backpressure::BackpressureHandler;
use crate::pipeline::batch::BatchAssembler;
use crate::pipeline::channel::create_channel;
use crate::pipeline::dispatch::DispatchPool;
use crate::pipeline::rate::{RateController, RateError};
use crate::pipeline::tracker::CompletionTracker;
use crate::report::RunSummary;
use crate::store::traits::IndexStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Wake-up horizon when nothing is scheduled
const IDLE_HORIZON: Duration = Duration::from_secs(3600);

/// Errors that can occur while setting up the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("rate error: {0}")]
    Rate(#[from] RateError),

    #[error("document synthesis error: {0}")]
    Synth(#[from] SynthError),
}

/// Rate-controlled generator feeding a [`DispatchPool`].
///
/// The control loop owns the rate state and the running totals. It only
/// assembles and submits batches; all store I/O happens in the pool.
pub struct Pusher {
    config: GeneratorConfig,
    store: Arc<dyn IndexStore>,
    assembler: BatchAssembler,
    rate: RateController,
    backpressure: BackpressureHandler,
}

impl Pusher {
    pub fn new(config: GeneratorConfig, store: Arc<dyn IndexStore>) -> Result<Self, PipelineError> {
        let synthesizer = Arc::new(Synthesizer::new(config.severity_weights)?);
        let assembler = BatchAssembler::new(synthesizer, config.batch_size);
        Self::with_assembler(config, store, assembler)
    }

    /// Pusher drawing batches from a caller-provided assembler
    pub fn with_assembler(
        config: GeneratorConfig,
        store: Arc<dyn IndexStore>,
        assembler: BatchAssembler,
    ) -> Result<Self, PipelineError> {
        let rate = RateController::new(config.rate, config.batch_size)?;
        let backpressure = BackpressureHandler::from_limit(config.max_in_flight);

        Ok(Self {
            config,
            store,
            assembler,
            rate,
            backpressure,
        })
    }

    pub fn batch_interval(&self) -> Duration {
        self.rate.batch_interval()
    }

    /// Run until the configured duration elapses or `shutdown` is cancelled,
    /// then wait for every in-flight dispatch before summarizing.
    pub async fn run(mut self, shutdown: CancellationToken) -> RunSummary {
        let config = &self.config;
        info!(index = %config.index, "Starting data push");
        match config.run_duration() {
            Some(d) => info!(
                rate = config.rate,
                duration_secs = d.as_secs(),
                "Target rate: {} docs/sec for {} seconds",
                config.rate,
                d.as_secs()
            ),
            None => info!(rate = config.rate, "Target rate: {} docs/sec (infinite mode)", config.rate),
        }
        info!(
            threads = config.threads,
            batch_size = config.batch_size,
            interval_ms = self.rate.batch_interval().as_millis(),
            backpressure = ?self.backpressure.strategy(),
            "Using {} workers with batch size {}",
            config.threads,
            config.batch_size
        );

        let started = Instant::now();
        // A duration past what an Instant can hold never ends: same as infinite
        let deadline = config.run_duration().and_then(|d| started.checked_add(d));
        let progress_every = Some(config.progress_interval).filter(|d| !d.is_zero());
        let mut next_progress = progress_every.and_then(|every| started.checked_add(every));

        let (completion_tx, completion_rx) = create_channel();
        let mut pool = DispatchPool::new(Arc::clone(&self.store), config.threads, completion_tx);
        let mut tracker = CompletionTracker::new(completion_rx);
        let mut interrupted = false;

        loop {
            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                break;
            }

            tracker.poll();

            let admitted = self.backpressure.admits(tracker.in_flight());
            if admitted && self.rate.is_due(now) {
                let batch = self.assembler.assemble();
                match pool.submit(batch) {
                    Ok(dispatch) => tracker.track(dispatch),
                    Err(e) => {
                        error!(error = %e, "Cannot submit batch, stopping");
                        break;
                    }
                }
                self.rate.mark_emitted(now);
            }

            if let (Some(at), Some(every)) = (next_progress, progress_every) {
                if now >= at {
                    let written = tracker.documents_written();
                    info!(
                        written,
                        in_flight = tracker.in_flight(),
                        rate = %format!("{:.1}", written as f64 / started.elapsed().as_secs_f64()),
                        "Progress"
                    );
                    next_progress = at.checked_add(every);
                }
            }

            // While saturated only a completion can unblock emission
            let next_emission = if self.backpressure.admits(tracker.in_flight()) {
                self.rate.next_due(now)
            } else {
                None
            };
            let wake = [next_emission, deadline, next_progress]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(now + IDLE_HORIZON);

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Interrupted, no further batches will be emitted");
                    interrupted = true;
                    break;
                }
                Some(completion) = tracker.next_completion() => {
                    tracker.record(completion);
                }
                _ = sleep_until(wake) => {}
            }
        }

        info!(
            outstanding = tracker.in_flight(),
            "Waiting for in-flight batches to complete"
        );
        let workers = pool.close();
        let stats = tracker.drain().await;
        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                error!(error = %e, "Worker task join error");
            }
        }

        let summary = RunSummary {
            index: self.config.index.clone(),
            documents_written: stats.documents_written,
            documents_rejected: stats.documents_rejected,
            batches_submitted: stats.submitted,
            transport_failures: stats.transport_failures,
            target_rate: self.config.rate,
            elapsed: started.elapsed(),
            configured_duration: self.config.run_duration(),
            peak_in_flight: stats.peak_in_flight,
            max_latency: stats.max_latency,
            interrupted,
        };

        info!("Indexing completed!");
        info!(total = summary.documents_written, "Total documents indexed");
        info!(elapsed_secs = %format!("{:.2}", summary.elapsed.as_secs_f64()), "Elapsed time");
        info!(rate = %format!("{:.1}", summary.achieved_rate()), "Actual rate");

        summary
    }
}
