pub mod backpressure;
pub mod batch;
pub mod channel;
pub mod dispatch;
pub mod rate;
pub mod runner;
pub mod tracker;

pub use backpressure::{BackpressureHandler, BackpressureStrategy};
pub use batch::{Batch, BatchAssembler};
pub use channel::{create_channel, Receiver, Sender};
pub use dispatch::{Completion, Dispatch, DispatchError, DispatchPool};
pub use rate::{batch_interval, RateController, RateError};
pub use runner::{PipelineError, Pusher};
pub use tracker::{CompletionTracker, TrackerStats};
