use crate::config::types::Config;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line options. Every setting except the flags is optional here:
/// unset options fall back to the config file, then to built-in defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "logsurge")]
#[command(about = "Push synthetic log documents to an index store at a target rate", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/logsurge/config.yml, then /etc/logsurge/config.yml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Target index or data stream name
    #[arg(long)]
    pub index: Option<String>,

    /// Target documents per second [default: 1000]
    #[arg(long)]
    pub rate: Option<f64>,

    /// Run length in seconds, 0 for infinite [default: 0]
    #[arg(long)]
    pub duration: Option<u64>,

    /// Run until interrupted, overriding --duration
    #[arg(long)]
    pub infinite: bool,

    /// Documents per bulk request [default: 500]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Concurrent bulk writers [default: 4]
    #[arg(long)]
    pub threads: Option<usize>,

    /// Pause emission while this many requests are unresolved, 0 for no limit [default: 0]
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Store endpoint, http:// assumed without a scheme [default: localhost:9200]
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long, env = "ES_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "ES_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Accept invalid TLS certificates (self-signed endpoints)
    #[arg(long)]
    pub no_verify_certs: bool,

    /// Per-request timeout in seconds [default: 60]
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Retries of a failed bulk request [default: 0]
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Seconds between progress log lines, 0 to disable [default: 10]
    #[arg(long)]
    pub progress_interval: Option<u64>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlay the options given on the command line onto `config`
    pub fn apply(&self, config: &mut Config) {
        let generator = &mut config.generator;
        if let Some(index) = &self.index {
            generator.index = index.clone();
        }
        if let Some(rate) = self.rate {
            generator.rate = rate;
        }
        if let Some(secs) = self.duration {
            generator.duration = Some(Duration::from_secs(secs));
        }
        if self.infinite {
            generator.duration = None;
        }
        if let Some(batch_size) = self.batch_size {
            generator.batch_size = batch_size;
        }
        if let Some(threads) = self.threads {
            generator.threads = threads;
        }
        if let Some(limit) = self.max_in_flight {
            generator.max_in_flight = limit;
        }
        if let Some(secs) = self.progress_interval {
            generator.progress_interval = Duration::from_secs(secs);
        }

        let store = &mut config.store;
        if let Some(host) = &self.host {
            store.host = host.clone();
        }
        if self.username.is_some() {
            store.username = self.username.clone();
        }
        if self.password.is_some() {
            store.password = self.password.clone();
        }
        if self.no_verify_certs {
            store.verify_certs = false;
        }
        if let Some(secs) = self.request_timeout {
            store.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.max_retries {
            store.max_retries = retries;
        }
    }
}
