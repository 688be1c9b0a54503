use crate::document::SeverityWeights;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Target index or data stream
    pub index: String,
    /// Target documents per second
    pub rate: f64,
    /// Run length; absent or zero means run until interrupted
    #[serde(with = "humantime_serde")]
    pub duration: Option<Duration>,
    pub batch_size: usize,
    /// Number of concurrent bulk writers
    pub threads: usize,
    /// Unresolved dispatches allowed before emission pauses; 0 is unbounded
    pub max_in_flight: usize,
    /// Period of the progress log line; zero disables it
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    pub severity_weights: SeverityWeights,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            index: String::new(),
            rate: default_rate(),
            duration: None,
            batch_size: default_batch_size(),
            threads: default_threads(),
            max_in_flight: 0,
            progress_interval: default_progress_interval(),
            severity_weights: SeverityWeights::default(),
        }
    }
}

impl GeneratorConfig {
    /// Deadline-bound run length, `None` when running forever
    pub fn run_duration(&self) -> Option<Duration> {
        self.duration.filter(|d| !d.is_zero())
    }

    pub fn is_infinite(&self) -> bool {
        self.run_duration().is_none()
    }
}

fn default_rate() -> f64 {
    1000.0
}

fn default_batch_size() -> usize {
    500
}

fn default_threads() -> usize {
    4
}

fn default_progress_interval() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Endpoint; `http://` is assumed when no scheme is given
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_certs: bool,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Transport-level retries per bulk call
    pub max_retries: usize,
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost:9200".to_string(),
            username: None,
            password: None,
            verify_certs: true,
            request_timeout: Duration::from_secs(60),
            max_retries: 0,
            retry_interval: Duration::from_secs(1),
        }
    }
}
