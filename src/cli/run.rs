use crate::cli::args::Cli;
use crate::config::{load_config, resolve_config_path, validate_config, Config, ConfigError, GeneratorConfig};
use crate::pipeline::{PipelineError, Pusher};
use crate::report::RunSummary;
use crate::store::{ElasticsearchStore, IndexStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("connection error: {0}")]
    Connection(#[source] StoreError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Config file (if any) overlaid with command-line options, validated
pub fn resolve_settings(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match resolve_config_path(cli.config.as_deref()) {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            load_config(&path)?
        }
        None => Config::default(),
    };

    cli.apply(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Effective settings as YAML, with the password masked
pub fn render_config(config: &Config) -> Result<String, ConfigError> {
    let mut shown = config.clone();
    if shown.store.password.is_some() {
        shown.store.password = Some("<redacted>".to_string());
    }
    Ok(serde_yaml::to_string(&shown)?)
}

/// Connect to the store named in the settings and push until done.
pub async fn run(config: Config) -> Result<RunSummary, RunError> {
    let store = ElasticsearchStore::new(&config.store, &config.generator.index)
        .map_err(RunError::Connection)?;

    if !config.store.verify_certs {
        warn!("TLS certificate verification is disabled");
    }

    let cluster = store.info().await.map_err(RunError::Connection)?;
    info!(
        host = %store.base_url(),
        "Connected to Elasticsearch {} at {}",
        cluster.version,
        cluster.cluster_name
    );

    run_with_store(config.generator, Arc::new(store)).await
}

/// Push to an already connected store; Ctrl+C stops emission and drains.
pub async fn run_with_store(
    generator: GeneratorConfig,
    store: Arc<dyn IndexStore>,
) -> Result<RunSummary, RunError> {
    let pusher = Pusher::new(generator, store)?;

    let shutdown = CancellationToken::new();
    let signal_handle = tokio::spawn(watch_interrupt(shutdown.clone()));

    let summary = pusher.run(shutdown).await;
    signal_handle.abort();
    // Err(cancelled) is the expected result of the abort
    let _ = signal_handle.await;

    Ok(summary)
}

async fn watch_interrupt(shutdown: CancellationToken) {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Unable to listen for interrupt signal");
        return;
    }
    info!("Interrupted by user, finishing in-flight batches (Ctrl+C again to abort)");
    shutdown.cancel();

    if signal::ctrl_c().await.is_ok() {
        warn!("Second interrupt, exiting without waiting for in-flight batches");
        std::process::exit(130);
    }
}
