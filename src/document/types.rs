use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One synthetic log/metric event.
///
/// Optional parts are explicit `Option`s. `error` is only ever populated for
/// [`Severity::Error`] documents; use [`Document::is_consistent`] to check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub level: Severity,
    pub message: String,
    pub environment: String,
    pub host: String,
    pub request_id: String,
    /// Serialized as `null` when absent
    pub user_id: Option<u32>,
    pub session_id: String,
    #[serde(flatten)]
    pub metrics: Metrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

impl Document {
    /// True when the error object is present exactly for error-level documents.
    pub fn is_consistent(&self) -> bool {
        self.error.is_some() == (self.level == Severity::Error)
    }
}

/// Numeric metrics, each independently present or absent.
///
/// Absent metrics are omitted from the serialized document entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage_percent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_processed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    pub error_type: String,
    pub stack_trace: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(level: Severity, error: Option<ErrorDetails>) -> Document {
        Document {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap(),
            service: "auth-service".to_string(),
            level,
            message: "Healthcheck passed".to_string(),
            environment: "prod".to_string(),
            host: "host-03".to_string(),
            request_id: "req_123456".to_string(),
            user_id: None,
            session_id: "sess_1234567".to_string(),
            metrics: Metrics {
                cpu_usage_percent: Some(42),
                ..Default::default()
            },
            error,
        }
    }

    #[test]
    fn test_serialized_shape() {
        let doc = sample(Severity::Info, None);
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["@timestamp"], "2026-01-28T10:00:00Z");
        assert_eq!(json["level"], "INFO");
        assert_eq!(json["cpu_usage_percent"], 42);
        // user_id keeps its key, absent metrics and error do not
        assert!(json["user_id"].is_null());
        assert!(json.as_object().unwrap().contains_key("user_id"));
        assert!(!json.as_object().unwrap().contains_key("response_time_ms"));
        assert!(!json.as_object().unwrap().contains_key("error"));
    }

    #[test]
    fn test_error_object_serialization() {
        let doc = sample(
            Severity::Error,
            Some(ErrorDetails {
                error_type: "TimeoutException".to_string(),
                stack_trace: "at auth-service.handler.process() line 120".to_string(),
            }),
        );
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["error"]["type"], "TimeoutException");
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_consistency_check() {
        assert!(sample(Severity::Warn, None).is_consistent());
        assert!(!sample(Severity::Error, None).is_consistent());
        let stray = ErrorDetails {
            error_type: "AuthError".to_string(),
            stack_trace: String::new(),
        };
        assert!(!sample(Severity::Debug, Some(stray)).is_consistent());
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Trace < Severity::Info);
        assert_eq!(Severity::ALL.iter().max(), Some(&Severity::Error));
        assert_eq!(Severity::Warn.to_string(), "WARN");
    }
}
