//! Synthesis of realistic microservice log documents.
//!
//! A [`Synthesizer`] holds only immutable catalogs and the severity
//! distribution, so one instance can be shared across tasks. Randomness comes
//! from the caller: every producer passes its own generator.

use super::types::{Document, ErrorDetails, Metrics, Severity};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum distance (in seconds) a document timestamp trails its base time
pub const MAX_TIMESTAMP_JITTER_SECS: i64 = 300;

/// Probability that each numeric metric is present
pub const METRIC_PROBABILITY: f64 = 0.7;

/// Probability that a user id is present
pub const USER_ID_PROBABILITY: f64 = 0.8;

pub const SERVICES: &[&str] = &[
    "user-service",
    "payment-service",
    "inventory-service",
    "notification-service",
    "auth-service",
    "catalog-service",
    "order-service",
    "shipping-service",
    "analytics-service",
];

pub const ENVIRONMENTS: &[&str] = &["prod", "staging", "dev"];

/// Message templates; each `{}` is filled independently
pub const MESSAGE_TEMPLATES: &[&str] = &[
    "Request processed successfully",
    "Database connection established",
    "Cache miss for key {}",
    "Rate limit exceeded for user {}",
    "Payment transaction completed",
    "User authentication successful",
    "API endpoint /api/v1/{} called",
    "Memory usage at {}%",
    "Processing batch of {} items",
    "Connection timeout after {}ms",
    "Scheduled task executed",
    "Configuration reloaded",
    "Healthcheck passed",
    "Queue size: {} items",
    "File upload completed: {} bytes",
];

pub const ERROR_TYPES: &[&str] = &[
    "TimeoutException",
    "ConnectionError",
    "ValidationError",
    "AuthError",
];

pub const USER_ID_RANGE: (u32, u32) = (1000, 50000);
pub const RESPONSE_TIME_MS_RANGE: (f64, f64) = (10.0, 5000.0);
pub const MEMORY_USAGE_MB_RANGE: (f64, f64) = (100.0, 4096.0);
pub const CPU_USAGE_PERCENT_RANGE: (u32, u32) = (1, 100);
pub const REQUEST_COUNT_RANGE: (u32, u32) = (1, 1000);
pub const ERROR_COUNT_RANGE: (u32, u32) = (0, 50);
pub const BYTES_PROCESSED_RANGE: (f64, f64) = (1024.0, 104_857_600.0);

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("severity weights must not all be zero")]
    AllWeightsZero,

    #[error("invalid severity weights: {0}")]
    InvalidWeights(WeightedError),
}

/// Relative weight of each severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub trace: u32,
    pub debug: u32,
    pub info: u32,
    pub warn: u32,
    pub error: u32,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            trace: 5,
            debug: 30,
            info: 40,
            warn: 15,
            error: 10,
        }
    }
}

impl SeverityWeights {
    /// Weight for a level
    pub fn weight(&self, level: Severity) -> u32 {
        match level {
            Severity::Trace => self.trace,
            Severity::Debug => self.debug,
            Severity::Info => self.info,
            Severity::Warn => self.warn,
            Severity::Error => self.error,
        }
    }

    /// Expected share of documents at `level`
    pub fn probability(&self, level: Severity) -> f64 {
        let total: u64 = Severity::ALL.iter().map(|l| self.weight(*l) as u64).sum();
        if total == 0 {
            return 0.0;
        }
        self.weight(level) as f64 / total as f64
    }
}

/// Produces one [`Document`] per call to [`Synthesizer::synthesize`].
#[derive(Debug, Clone)]
pub struct Synthesizer {
    severity: WeightedIndex<u32>,
}

impl Synthesizer {
    pub fn new(weights: SeverityWeights) -> Result<Self, SynthError> {
        let raw: Vec<u32> = Severity::ALL.iter().map(|l| weights.weight(*l)).collect();
        let severity = WeightedIndex::new(&raw).map_err(|e| match e {
            WeightedError::AllWeightsZero => SynthError::AllWeightsZero,
            other => SynthError::InvalidWeights(other),
        })?;

        Ok(Self { severity })
    }

    /// Build a document whose timestamp trails `base_time` by 0 to 300 seconds.
    pub fn synthesize<R: Rng + ?Sized>(&self, rng: &mut R, base_time: DateTime<Utc>) -> Document {
        let jitter = rng.gen_range(0..=MAX_TIMESTAMP_JITTER_SECS);
        let timestamp = base_time - Duration::seconds(jitter);

        let service = pick(rng, SERVICES);
        let level = Severity::ALL[self.severity.sample(rng)];
        let template = pick(rng, MESSAGE_TEMPLATES);
        let message = fill_template(rng, template);
        let metrics = synthesize_metrics(rng);

        let environment = pick(rng, ENVIRONMENTS).to_string();
        let host = format!("host-{:02}", rng.gen_range(1..=20));
        let request_id = format!("req_{}", rng.gen_range(100_000..=999_999));
        let user_id = if rng.gen_bool(USER_ID_PROBABILITY) {
            Some(rng.gen_range(USER_ID_RANGE.0..=USER_ID_RANGE.1))
        } else {
            None
        };
        let session_id = format!("sess_{}", rng.gen_range(1_000_000..=9_999_999));

        let error = (level == Severity::Error).then(|| ErrorDetails {
            error_type: pick(rng, ERROR_TYPES).to_string(),
            stack_trace: format!(
                "at {}.handler.process() line {}",
                service,
                rng.gen_range(50..=500)
            ),
        });

        Document {
            timestamp,
            service: service.to_string(),
            level,
            message,
            environment,
            host,
            request_id,
            user_id,
            session_id,
            metrics,
            error,
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(SeverityWeights::default()).expect("default severity weights are valid")
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, catalog: &[&'static str]) -> &'static str {
    catalog[rng.gen_range(0..catalog.len())]
}

fn fill_template<R: Rng + ?Sized>(rng: &mut R, template: &str) -> String {
    let mut parts = template.split("{}");
    let mut message = String::with_capacity(template.len() + 16);
    if let Some(head) = parts.next() {
        message.push_str(head);
    }
    for part in parts {
        message.push_str(&placeholder(rng));
        message.push_str(part);
    }
    message
}

fn placeholder<R: Rng + ?Sized>(rng: &mut R) -> String {
    match rng.gen_range(0..7) {
        0 => rng.gen_range(1..=1000).to_string(),
        1 => format!("user_{}", rng.gen_range(1000..=9999)),
        2 => format!("session_{}", rng.gen_range(10_000..=99_999)),
        3 => rng.gen_range(50..=95).to_string(),
        4 => "orders".to_string(),
        5 => "products".to_string(),
        _ => rng.gen_range(100..=10_000).to_string(),
    }
}

fn synthesize_metrics<R: Rng + ?Sized>(rng: &mut R) -> Metrics {
    Metrics {
        response_time_ms: maybe(rng, |r| two_decimals(r, RESPONSE_TIME_MS_RANGE)),
        memory_usage_mb: maybe(rng, |r| two_decimals(r, MEMORY_USAGE_MB_RANGE)),
        cpu_usage_percent: maybe(rng, |r| {
            r.gen_range(CPU_USAGE_PERCENT_RANGE.0..=CPU_USAGE_PERCENT_RANGE.1)
        }),
        request_count: maybe(rng, |r| r.gen_range(REQUEST_COUNT_RANGE.0..=REQUEST_COUNT_RANGE.1)),
        error_count: maybe(rng, |r| r.gen_range(ERROR_COUNT_RANGE.0..=ERROR_COUNT_RANGE.1)),
        bytes_processed: maybe(rng, |r| two_decimals(r, BYTES_PROCESSED_RANGE)),
    }
}

fn maybe<R, T, F>(rng: &mut R, value: F) -> Option<T>
where
    R: Rng + ?Sized,
    F: FnOnce(&mut R) -> T,
{
    if rng.gen_bool(METRIC_PROBABILITY) {
        Some(value(rng))
    } else {
        None
    }
}

fn two_decimals<R: Rng + ?Sized>(rng: &mut R, (min, max): (f64, f64)) -> f64 {
    let value: f64 = rng.gen_range(min..=max);
    // rounding can never leave [min, max] since both bounds are whole numbers
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_error_object_iff_error_level() {
        let synth = Synthesizer::default();
        let mut rng = StdRng::seed_from_u64(7);

        let mut errors = 0;
        for _ in 0..5_000 {
            let doc = synth.synthesize(&mut rng, base_time());
            assert!(doc.is_consistent(), "inconsistent document: {:?}", doc);
            if let Some(err) = &doc.error {
                errors += 1;
                assert!(ERROR_TYPES.contains(&err.error_type.as_str()));
                assert!(err.stack_trace.starts_with(&format!("at {}.handler", doc.service)));
            }
        }
        assert!(errors > 0);
    }

    #[test]
    fn test_timestamp_within_trailing_window() {
        let synth = Synthesizer::default();
        let mut rng = StdRng::seed_from_u64(11);
        let base = base_time();
        let earliest = base - Duration::seconds(MAX_TIMESTAMP_JITTER_SECS);

        for _ in 0..5_000 {
            let doc = synth.synthesize(&mut rng, base);
            assert!(doc.timestamp <= base);
            assert!(doc.timestamp >= earliest);
        }
    }

    #[test]
    fn test_required_fields_come_from_catalogs() {
        let synth = Synthesizer::default();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..1_000 {
            let doc = synth.synthesize(&mut rng, base_time());
            assert!(SERVICES.contains(&doc.service.as_str()));
            assert!(ENVIRONMENTS.contains(&doc.environment.as_str()));
            assert!(doc.host.starts_with("host-") && doc.host.len() == 7);
            assert!(doc.request_id.starts_with("req_"));
            assert!(doc.session_id.starts_with("sess_"));
            assert!(!doc.message.contains("{}"));
            if let Some(user) = doc.user_id {
                assert!((USER_ID_RANGE.0..=USER_ID_RANGE.1).contains(&user));
            }
        }
    }

    #[test]
    fn test_template_placeholders_are_filled() {
        let mut rng = StdRng::seed_from_u64(5);
        let message = fill_template(&mut rng, "Memory usage at {}%");
        assert!(message.starts_with("Memory usage at "));
        assert!(message.ends_with('%'));
        assert!(!message.contains("{}"));

        let plain = fill_template(&mut rng, "Healthcheck passed");
        assert_eq!(plain, "Healthcheck passed");
    }

    #[test]
    fn test_custom_weights_exclude_zero_levels() {
        let weights = SeverityWeights {
            trace: 0,
            debug: 0,
            info: 1,
            warn: 0,
            error: 1,
        };
        let synth = Synthesizer::new(weights).unwrap();
        let mut rng = StdRng::seed_from_u64(19);

        for _ in 0..2_000 {
            let doc = synth.synthesize(&mut rng, base_time());
            assert!(matches!(doc.level, Severity::Info | Severity::Error));
        }
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let weights = SeverityWeights {
            trace: 0,
            debug: 0,
            info: 0,
            warn: 0,
            error: 0,
        };
        assert!(matches!(
            Synthesizer::new(weights),
            Err(SynthError::AllWeightsZero)
        ));
    }

    #[test]
    fn test_default_weight_probabilities() {
        let weights = SeverityWeights::default();
        assert!((weights.probability(Severity::Info) - 0.40).abs() < 1e-9);
        assert!((weights.probability(Severity::Trace) - 0.05).abs() < 1e-9);
    }
}
