//! The seam between the publisher and the messaging client.
//!
//! `KafkaTransport` implements it over rdkafka; tests implement it in memory.

use crate::error::SendError;
use async_trait::async_trait;
use std::time::Duration;

/// Where an acknowledged record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicInfo {
    pub name: String,
    pub partitions: usize,
}

/// Cluster metadata as seen by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMetadata {
    pub brokers: Vec<BrokerInfo>,
    /// Broker that answered the metadata request.
    pub answered_by: Option<i32>,
    pub topics: Vec<TopicInfo>,
}

impl ClusterMetadata {
    pub fn topic(&self, name: &str) -> Option<&TopicInfo> {
        self.topics.iter().find(|t| t.name == name)
    }
}

/// A connection to the messaging cluster, owned by one run.
#[async_trait]
pub trait Transport: Send {
    /// Fetch cluster metadata, waiting at most `timeout`.
    async fn fetch_metadata(&mut self, timeout: Duration) -> Result<ClusterMetadata, SendError>;

    /// Publish one record and wait for its acknowledgment.
    async fn send(
        &mut self,
        topic: &str,
        key: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, SendError>;

    /// Flush outstanding records and release the connection.
    async fn close(&mut self);
}
