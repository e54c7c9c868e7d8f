//! Synthetic application log events for the kafka-log-generator demo.
//!
//! The `EventSynthesizer` produces structured log records with a realistic
//! statistical shape: a weighted level mix, uniformly chosen services, and
//! request metrics whose durations and status codes follow the level.
//!
//! # Architecture
//!
//! ```text
//!   seed (optional)
//!        │
//!        ▼
//! ┌──────────────────┐     ┌─────────────────────┐
//! │ EventSynthesizer │────▶│ catalog.rs          │
//! │                  │     │ - services / hosts  │
//! │ - rng (StdRng)   │     │ - messages by level │
//! │ - index          │     │ - CumulativeTable   │
//! └────────┬─────────┘     └─────────────────────┘
//!          │
//!          ▼
//!    LogEvent ──▶ JSON payload, keyed by service
//! ```
//!
//! # Example
//!
//! ```rust
//! use log_event_generator::EventSynthesizer;
//!
//! let mut synthesizer = EventSynthesizer::new(42);
//! for event in synthesizer.events(3) {
//!     let payload = event.to_payload().unwrap();
//!     println!("{} {}", event.partition_key(), String::from_utf8_lossy(&payload));
//! }
//! ```

pub mod catalog;
pub mod distribution;
pub mod event;
pub mod synthesizer;

pub use distribution::CumulativeTable;
pub use event::{DiagnosticRecord, Level, LogEvent, Metrics};
pub use synthesizer::{EventSynthesizer, LogEvents};
