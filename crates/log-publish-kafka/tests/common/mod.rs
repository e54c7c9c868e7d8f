//! In-memory transport for dispatcher and probe tests.

#![allow(dead_code)]

use async_trait::async_trait;
use log_publish_kafka::{
    resolve, BrokerInfo, ClusterMetadata, ConfigOverrides, Configuration, Delivery, SendError,
    TopicInfo, Transport,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TOPIC: &str = "application-logs";

pub fn test_config() -> Configuration {
    let overrides = ConfigOverrides {
        brokers: Some("broker-1:9092,broker-2:9092".into()),
        topic: Some(TOPIC.into()),
        ..Default::default()
    };
    resolve(&HashMap::new(), &overrides).unwrap()
}

pub fn two_broker_metadata(topics: &[(&str, usize)]) -> ClusterMetadata {
    ClusterMetadata {
        brokers: vec![
            BrokerInfo {
                id: 1,
                host: "broker-1".into(),
                port: 9092,
            },
            BrokerInfo {
                id: 2,
                host: "broker-2".into(),
                port: 9092,
            },
        ],
        answered_by: Some(1),
        topics: topics
            .iter()
            .map(|(name, partitions)| TopicInfo {
                name: name.to_string(),
                partitions: *partitions,
            })
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct SentRecord {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

impl SentRecord {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Shared view of what a `MockTransport` did, usable after it was moved.
#[derive(Clone, Default)]
pub struct MockHandle {
    sent: Arc<Mutex<Vec<SentRecord>>>,
    calls: Arc<Mutex<u64>>,
    closed: Arc<AtomicBool>,
}

impl MockHandle {
    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of send calls, retries included.
    pub fn calls(&self) -> u64 {
        *self.calls.lock().unwrap()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

type SendRule = Box<dyn FnMut(u64) -> Option<SendError> + Send>;

pub struct MockTransport {
    handle: MockHandle,
    metadata: Option<Result<ClusterMetadata, SendError>>,
    rule: SendRule,
    hang_sends: bool,
    cancel_after: Option<(u64, CancellationToken)>,
    acknowledged: u64,
}

impl MockTransport {
    /// Acknowledges every send; metadata lists the test topic.
    pub fn responsive() -> Self {
        Self {
            handle: MockHandle::default(),
            metadata: Some(Ok(two_broker_metadata(&[(TOPIC, 3)]))),
            rule: Box::new(|_| None),
            hang_sends: false,
            cancel_after: None,
            acknowledged: 0,
        }
    }

    /// Fail send call `n` (zero-based, retries included) when `rule(n)`
    /// returns an error.
    pub fn with_rule(
        mut self,
        rule: impl FnMut(u64) -> Option<SendError> + Send + 'static,
    ) -> Self {
        self.rule = Box::new(rule);
        self
    }

    pub fn with_metadata(mut self, metadata: Result<ClusterMetadata, SendError>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Metadata requests never complete.
    pub fn silent(mut self) -> Self {
        self.metadata = None;
        self
    }

    /// Sends never complete.
    pub fn hanging_sends(mut self) -> Self {
        self.hang_sends = true;
        self
    }

    /// Cancel `token` once `n` send calls have completed.
    pub fn cancel_after(mut self, n: u64, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_metadata(&mut self, _timeout: Duration) -> Result<ClusterMetadata, SendError> {
        match &self.metadata {
            Some(result) => result.clone(),
            None => std::future::pending().await,
        }
    }

    async fn send(
        &mut self,
        topic: &str,
        key: &str,
        payload: &[u8],
        _timeout: Duration,
    ) -> Result<Delivery, SendError> {
        if self.hang_sends {
            return std::future::pending().await;
        }

        let call = {
            let mut calls = self.handle.calls.lock().unwrap();
            let call = *calls;
            *calls += 1;
            call
        };
        self.handle.sent.lock().unwrap().push(SentRecord {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_vec(),
        });

        let result = match (self.rule)(call) {
            Some(err) => Err(err),
            None => {
                self.acknowledged += 1;
                Ok(Delivery {
                    partition: 0,
                    offset: self.acknowledged as i64 - 1,
                })
            }
        };

        if let Some((n, token)) = &self.cancel_after {
            if call + 1 >= *n {
                token.cancel();
            }
        }

        result
    }

    async fn close(&mut self) {
        self.handle.closed.store(true, Ordering::SeqCst);
    }
}
