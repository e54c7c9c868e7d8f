//! Pre-flight connectivity diagnostics.
//!
//! The probe runs three single-shot checks in order: cluster metadata, topic
//! lookup, and a write of one diagnostic record. Nothing is retried; each
//! step is bounded by the probe timeout.

use crate::config::Configuration;
use crate::error::{PublisherError, SendError};
use crate::transport::{BrokerInfo, Delivery, Transport};
use log_event_generator::DiagnosticRecord;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether the target topic showed up in cluster metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicStatus {
    Present { partitions: usize },
    /// Not fatal: brokers may auto-create topics on first write.
    Missing,
}

/// Result of the write check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCheck {
    Acknowledged(Delivery),
    Failed(String),
}

/// A non-fatal observation the caller may choose to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    TopicMissing { topic: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub topic: String,
    pub brokers: Vec<BrokerInfo>,
    pub answered_by: Option<i32>,
    pub topic_status: TopicStatus,
    pub write: WriteCheck,
}

impl ProbeResult {
    pub fn brokers_reachable(&self) -> bool {
        !self.brokers.is_empty()
    }

    pub fn broker_count(&self) -> usize {
        self.brokers.len()
    }

    /// True when some broker answered on behalf of the cluster.
    pub fn controller_present(&self) -> bool {
        self.answered_by.is_some()
    }

    pub fn findings(&self) -> Vec<Finding> {
        match self.topic_status {
            TopicStatus::Missing => vec![Finding::TopicMissing {
                topic: self.topic.clone(),
            }],
            TopicStatus::Present { .. } => Vec::new(),
        }
    }

    /// Fail with `WritePermission` when the write check did not succeed.
    pub fn verdict(&self) -> Result<(), PublisherError> {
        match &self.write {
            WriteCheck::Acknowledged(_) => Ok(()),
            WriteCheck::Failed(reason) => Err(PublisherError::WritePermission {
                topic: self.topic.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Runs the connectivity checks against a transport.
#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    timeout: Duration,
}

impl Default for ConnectivityProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl ConnectivityProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run all checks and aggregate them.
    ///
    /// Fails only when no broker answers; a missing topic or a failed write is
    /// reported in the returned [`ProbeResult`].
    pub async fn run<T: Transport + ?Sized>(
        &self,
        config: &Configuration,
        transport: &mut T,
    ) -> Result<ProbeResult, PublisherError> {
        let brokers = config.bootstrap_servers();
        let topic = config.topic().to_string();

        info!(
            "[1/3] Fetching cluster metadata from {brokers} ({})",
            config.security_protocol()
        );
        let broker_error = |reason: String| PublisherError::BrokerUnreachable {
            brokers: brokers.clone(),
            reason,
        };
        let fetch = transport.fetch_metadata(self.timeout);
        let metadata = match tokio::time::timeout(self.timeout, fetch).await {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => return Err(broker_error(e.to_string())),
            Err(_) => {
                return Err(broker_error(format!(
                    "no response within {:?}",
                    self.timeout
                )))
            }
        };
        if metadata.brokers.is_empty() {
            return Err(broker_error("cluster metadata lists no brokers".to_string()));
        }
        info!("      Connected to {} broker(s)", metadata.brokers.len());
        for broker in &metadata.brokers {
            info!("        - {}:{} (node {})", broker.host, broker.port, broker.id);
        }

        info!("[2/3] Checking topic '{topic}'");
        let topic_status = match metadata.topic(&topic) {
            Some(found) => {
                info!(
                    "      Topic '{topic}' exists with {} partition(s)",
                    found.partitions
                );
                TopicStatus::Present {
                    partitions: found.partitions,
                }
            }
            None => {
                let available: Vec<&str> =
                    metadata.topics.iter().take(5).map(|t| t.name.as_str()).collect();
                warn!(
                    "      Topic '{topic}' not found; it may be auto-created on first write. Available: {available:?}"
                );
                TopicStatus::Missing
            }
        };

        info!("[3/3] Testing write permission");
        let write = self.write_check(&topic, transport).await;
        match &write {
            WriteCheck::Acknowledged(delivery) => info!(
                "      Test record written to partition {} at offset {}",
                delivery.partition, delivery.offset
            ),
            WriteCheck::Failed(reason) => warn!("      Failed to write test record: {reason}"),
        }

        Ok(ProbeResult {
            topic,
            brokers: metadata.brokers,
            answered_by: metadata.answered_by,
            topic_status,
            write,
        })
    }

    /// Run all checks and fail on a rejected write.
    pub async fn verify<T: Transport + ?Sized>(
        &self,
        config: &Configuration,
        transport: &mut T,
    ) -> Result<ProbeResult, PublisherError> {
        let result = self.run(config, transport).await?;
        result.verdict()?;
        Ok(result)
    }

    async fn write_check<T: Transport + ?Sized>(
        &self,
        topic: &str,
        transport: &mut T,
    ) -> WriteCheck {
        let payload = match DiagnosticRecord::now().to_payload() {
            Ok(payload) => payload,
            Err(e) => return WriteCheck::Failed(format!("could not encode test record: {e}")),
        };

        let send = transport.send(topic, DiagnosticRecord::KEY, &payload, self.timeout);
        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(delivery)) => WriteCheck::Acknowledged(delivery),
            Ok(Err(e)) => WriteCheck::Failed(e.to_string()),
            Err(_) => WriteCheck::Failed(SendError::Timeout(self.timeout).to_string()),
        }
    }
}
