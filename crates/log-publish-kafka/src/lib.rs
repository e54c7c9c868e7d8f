//! Kafka publishing for the kafka-log-generator demo.
//!
//! This crate resolves connection settings, checks that the cluster is
//! reachable and writable, and drives the send loop that publishes
//! synthesized log events as JSON records keyed by service name.
//!
//! # Architecture
//!
//! ```text
//!  env vars + overrides
//!          │
//!          ▼
//!   config::resolve ──▶ Configuration
//!                            │
//!              ┌─────────────┴─────────────┐
//!              ▼                           ▼
//!   ┌────────────────────┐      ┌────────────────────┐
//!   │ ConnectivityProbe  │      │ Dispatcher         │
//!   │ metadata → topic → │      │ EventSynthesizer → │
//!   │ test write         │      │ JSON → send → ack  │
//!   └─────────┬──────────┘      └─────────┬──────────┘
//!             └──────────┬────────────────┘
//!                        ▼
//!               Transport (KafkaTransport)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use log_event_generator::EventSynthesizer;
//! use log_publish_kafka::{config, DispatchParams, Dispatcher, KafkaTransport};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let env: HashMap<String, String> = std::env::vars().collect();
//!     let config = config::resolve(&env, &config::ConfigOverrides::default())?;
//!
//!     let transport = KafkaTransport::connect(&config)?;
//!     let dispatcher = Dispatcher::new(&config, DispatchParams::bounded(50));
//!     let outcome = dispatcher.run(EventSynthesizer::new(42), transport).await?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod kafka;
pub mod probe;
pub mod transport;

// Re-exports for convenience
pub use config::{resolve, ConfigOverrides, Configuration, SaslMechanism, SecurityProtocol};
pub use dispatch::{DispatchOutcome, DispatchParams, Dispatcher, RetryPolicy, RunLength};
pub use error::{PublisherError, SendError};
pub use kafka::KafkaTransport;
pub use probe::{ConnectivityProbe, Finding, ProbeResult, TopicStatus, WriteCheck};
pub use transport::{BrokerInfo, ClusterMetadata, Delivery, TopicInfo, Transport};
