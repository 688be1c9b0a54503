pub mod synth;
pub mod types;

pub use synth::{SeverityWeights, SynthError, Synthesizer};
pub use types::{Document, ErrorDetails, Metrics, Severity};
