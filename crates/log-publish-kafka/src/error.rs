//! Error types for the Kafka publisher.

use crate::dispatch::DispatchOutcome;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a probe or dispatch run.
#[derive(Error, Debug)]
pub enum PublisherError {
    /// Missing or invalid settings, raised before any network activity.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No broker reachable in [{brokers}]: {reason}")]
    BrokerUnreachable { brokers: String, reason: String },

    #[error("Write to topic '{topic}' not permitted: {reason}")]
    WritePermission { topic: String, reason: String },

    /// A systemic failure stopped the run; the partial outcome is kept.
    #[error("Dispatch aborted: {reason}")]
    DispatchAborted {
        reason: String,
        outcome: DispatchOutcome,
    },

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PublisherError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PublisherError::Configuration(msg.into())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PublisherError::Configuration(_) => 2,
            PublisherError::BrokerUnreachable { .. } => 3,
            PublisherError::WritePermission { .. } => 4,
            PublisherError::DispatchAborted { .. } => 5,
            PublisherError::Kafka(_) | PublisherError::Serialization(_) => 1,
        }
    }

    /// Partial outcome of an aborted run.
    pub fn outcome(&self) -> Option<&DispatchOutcome> {
        match self {
            PublisherError::DispatchAborted { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

/// Failure of a single send or metadata request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Authorization or authentication failure.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("no acknowledgment within {0:?}")]
    Timeout(Duration),

    /// No broker answered; treated as systemic by the dispatcher.
    #[error("brokers unreachable: {0}")]
    Unreachable(String),

    #[error("rejected by broker: {0}")]
    Rejected(String),
}

impl SendError {
    pub fn is_systemic(&self) -> bool {
        matches!(self, SendError::Unreachable(_))
    }

    /// Whether sending the same record again might succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, SendError::Timeout(_) | SendError::Rejected(_))
    }
}
