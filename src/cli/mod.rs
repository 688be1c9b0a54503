pub mod args;
pub mod run;

pub use args::Cli;
pub use run::{render_config, resolve_settings, run, run_with_store, RunError};
