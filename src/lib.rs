//! Synthetic log load generator.
//!
//! Documents are synthesized in batches, emitted at a fixed interval derived
//! from the target rate, and written by a fixed pool of bulk writers. The
//! achieved rate is measured, not guaranteed.

pub mod cli;
pub mod config;
pub mod document;
pub mod pipeline;
pub mod report;
pub mod store;
