//! rdkafka-backed transport.

use crate::config::Configuration;
use crate::error::{PublisherError, SendError};
use crate::transport::{BrokerInfo, ClusterMetadata, Delivery, TopicInfo, Transport};
use async_trait::async_trait;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::metadata::Metadata;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CLIENT_ID: &str = "kafka-log-generator";

/// How long a record may wait for acknowledgment.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `close` waits for outstanding records.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the librdkafka client properties for `config`.
pub fn client_config(config: &Configuration, message_timeout: Duration) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", config.bootstrap_servers())
        .set("client.id", CLIENT_ID)
        .set("security.protocol", config.security_protocol().as_rdkafka_str())
        .set("message.timeout.ms", message_timeout.as_millis().to_string());

    if let Some(sasl) = config.sasl() {
        client
            .set("sasl.mechanism", sasl.mechanism.as_rdkafka_str())
            .set("sasl.username", &sasl.username)
            .set("sasl.password", &sasl.password);
    }

    client
}

/// A producer connection to the configured cluster.
pub struct KafkaTransport {
    producer: Option<FutureProducer>,
}

impl KafkaTransport {
    /// Create the producer. librdkafka connects lazily, so this only fails on
    /// invalid client properties.
    pub fn connect(config: &Configuration) -> Result<Self, PublisherError> {
        Self::connect_with_timeout(config, DEFAULT_MESSAGE_TIMEOUT)
    }

    pub fn connect_with_timeout(
        config: &Configuration,
        message_timeout: Duration,
    ) -> Result<Self, PublisherError> {
        let producer: FutureProducer = client_config(config, message_timeout)
            .create()
            .map_err(PublisherError::Kafka)?;

        info!(
            brokers = %config.bootstrap_servers(),
            security = %config.security_protocol(),
            "Kafka producer created"
        );

        Ok(Self {
            producer: Some(producer),
        })
    }

    fn producer(&self) -> Result<&FutureProducer, SendError> {
        self.producer
            .as_ref()
            .ok_or_else(|| SendError::Unreachable("producer already closed".to_string()))
    }
}

#[async_trait]
impl Transport for KafkaTransport {
    async fn fetch_metadata(&mut self, timeout: Duration) -> Result<ClusterMetadata, SendError> {
        let producer = self.producer()?.clone();

        // fetch_metadata blocks the calling thread
        tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, Timeout::After(timeout))
                .map(|metadata| convert_metadata(&metadata))
        })
        .await
        .map_err(|e| SendError::Unreachable(format!("metadata task failed: {e}")))?
        .map_err(|e| classify(e, timeout))
    }

    async fn send(
        &mut self,
        topic: &str,
        key: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, SendError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);
        let delivery = self.producer()?.send(record, Timeout::After(timeout));

        match tokio::time::timeout(timeout, delivery).await {
            Ok(Ok(delivery)) => Ok(Delivery {
                partition: delivery.partition,
                offset: delivery.offset,
            }),
            Ok(Err((err, _message))) => Err(classify(err, timeout)),
            Err(_) => Err(SendError::Timeout(timeout)),
        }
    }

    async fn close(&mut self) {
        let Some(producer) = self.producer.take() else {
            return;
        };

        let flushed = tokio::task::spawn_blocking(move || {
            let result = producer.flush(Timeout::After(FLUSH_TIMEOUT));
            drop(producer);
            result
        })
        .await;

        match flushed {
            Ok(Ok(())) => debug!("Kafka producer flushed and closed"),
            Ok(Err(e)) => warn!("Kafka producer closed with unflushed records: {e}"),
            Err(e) => warn!("Kafka producer close task failed: {e}"),
        }
    }
}

impl Drop for KafkaTransport {
    fn drop(&mut self) {
        if self.producer.is_some() {
            debug!("Kafka transport dropped without close; outstanding records are discarded");
        }
    }
}

fn convert_metadata(metadata: &Metadata) -> ClusterMetadata {
    ClusterMetadata {
        brokers: metadata
            .brokers()
            .iter()
            .map(|b| BrokerInfo {
                id: b.id(),
                host: b.host().to_string(),
                port: b.port(),
            })
            .collect(),
        answered_by: Some(metadata.orig_broker_id()),
        topics: metadata
            .topics()
            .iter()
            .filter(|t| t.error().is_none())
            .map(|t| TopicInfo {
                name: t.name().to_string(),
                partitions: t.partitions().len(),
            })
            .collect(),
    }
}

/// Map an rdkafka error onto the send failure taxonomy.
fn classify(err: KafkaError, timeout: Duration) -> SendError {
    match err.rdkafka_error_code() {
        Some(
            RDKafkaErrorCode::TopicAuthorizationFailed
            | RDKafkaErrorCode::ClusterAuthorizationFailed
            | RDKafkaErrorCode::SaslAuthenticationFailed,
        ) => SendError::Unauthorized(err.to_string()),
        Some(RDKafkaErrorCode::MessageTimedOut | RDKafkaErrorCode::RequestTimedOut) => {
            SendError::Timeout(timeout)
        }
        Some(RDKafkaErrorCode::AllBrokersDown | RDKafkaErrorCode::BrokerTransportFailure) => {
            SendError::Unreachable(err.to_string())
        }
        _ => SendError::Rejected(err.to_string()),
    }
}
