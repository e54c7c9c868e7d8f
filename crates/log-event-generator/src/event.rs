//! The log record published to Kafka.
//!
//! Field names and nesting are part of the wire contract: the ingestion tier
//! infers its table schema from the JSON shape, so optional fields are
//! omitted rather than emitted as `null`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request metrics, present only on request-style events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub duration_ms: u32,
    pub status_code: u16,
}

/// A synthesized application log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub service: &'static str,
    pub host: &'static str,
    pub request_id: String,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

impl LogEvent {
    /// Partition key for this event. Records from one service share a
    /// partition and therefore keep their relative order.
    pub fn partition_key(&self) -> &str {
        self.service
    }

    /// Encode the event as its JSON wire payload.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// The record written by the connectivity probe's write check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRecord {
    pub test: bool,
    pub message: &'static str,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticRecord {
    pub const KEY: &'static str = "test";

    pub fn now() -> Self {
        Self {
            test: true,
            message: "Connection test from kafka-log-generator",
            timestamp: Utc::now(),
        }
    }

    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

// RFC 3339 with a `Z` suffix and millisecond precision.
fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    fn sample_event() -> LogEvent {
        LogEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            level: Level::Error,
            service: "payment-service",
            host: "payment-server-02",
            request_id: "req-0000beef-000001".to_string(),
            message: "Payment gateway timeout",
            error: Some("GatewayTimeout"),
            user_id: None,
            ip_address: None,
            amount: None,
            metrics: Some(Metrics {
                duration_ms: 4200,
                status_code: 504,
            }),
        }
    }

    #[test]
    fn test_payload_shape() {
        let payload = sample_event().to_payload().unwrap();
        let json: Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(json["timestamp"], "2024-03-01T12:30:00.000Z");
        assert_eq!(json["level"], "ERROR");
        assert_eq!(json["service"], "payment-service");
        assert_eq!(json["host"], "payment-server-02");
        assert_eq!(json["request_id"], "req-0000beef-000001");
        assert_eq!(json["error"], "GatewayTimeout");
        assert_eq!(json["metrics"]["duration_ms"], 4200);
        assert_eq!(json["metrics"]["status_code"], 504);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let mut event = sample_event();
        event.error = None;
        event.metrics = None;

        let json: Value = serde_json::from_slice(&event.to_payload().unwrap()).unwrap();
        let obj = json.as_object().unwrap();

        assert!(!obj.contains_key("error"));
        assert!(!obj.contains_key("metrics"));
        assert!(!obj.contains_key("user_id"));
        assert_eq!(obj.len(), 6);
    }

    #[test]
    fn test_partition_key_is_service() {
        assert_eq!(sample_event().partition_key(), "payment-service");
    }

    #[test]
    fn test_diagnostic_record() {
        let json: Value =
            serde_json::from_slice(&DiagnosticRecord::now().to_payload().unwrap()).unwrap();
        assert_eq!(json["test"], true);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
