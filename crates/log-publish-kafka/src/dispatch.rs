//! The send loop.
//!
//! One task drives the whole run: generate an event, serialize it, publish it
//! keyed by service and wait for the acknowledgment, then pause for the
//! configured delay. Per-record failures are counted and the run continues;
//! only a systemic failure ends it early.

use crate::config::Configuration;
use crate::error::{PublisherError, SendError};
use crate::kafka::DEFAULT_MESSAGE_TIMEOUT;
use crate::transport::{Delivery, Transport};
use log_event_generator::{EventSynthesizer, LogEvent};
use std::fmt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consecutive failed sends after which the run is considered dead.
pub const DEFAULT_ABORT_AFTER: u32 = 10;

/// How many records to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLength {
    Bounded(u64),
    /// Until the cancellation token fires.
    Continuous,
}

/// Retry policy for transient per-record failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Wait before the first retry; doubles on each further retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchParams {
    pub count: RunLength,
    /// Pause between consecutive sends.
    pub delay: Duration,
    /// Acknowledgment wait per send; a send still pending after it fails as a timeout.
    pub ack_timeout: Duration,
    pub retry: RetryPolicy,
    /// Abort after this many consecutive failures; 0 disables the check.
    pub abort_after: u32,
}

impl DispatchParams {
    pub fn bounded(count: u64) -> Self {
        Self {
            count: RunLength::Bounded(count),
            ..Default::default()
        }
    }

    pub fn continuous() -> Self {
        Self {
            count: RunLength::Continuous,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    pub fn with_abort_after(mut self, abort_after: u32) -> Self {
        self.abort_after = abort_after;
        self
    }
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            count: RunLength::Bounded(10),
            delay: Duration::ZERO,
            ack_timeout: DEFAULT_MESSAGE_TIMEOUT,
            retry: RetryPolicy::none(),
            abort_after: DEFAULT_ABORT_AFTER,
        }
    }
}

/// Summary of one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub attempted: u64,
    pub acknowledged: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

impl DispatchOutcome {
    /// Acknowledged records per second.
    pub fn records_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.acknowledged as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted={} acknowledged={} failed={} elapsed={:.2?} ({:.2} records/sec)",
            self.attempted,
            self.acknowledged,
            self.failed,
            self.elapsed,
            self.records_per_second()
        )
    }
}

/// Publishes synthesized events to one topic.
pub struct Dispatcher {
    topic: String,
    params: DispatchParams,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(config: &Configuration, params: DispatchParams) -> Self {
        Self {
            topic: config.topic().to_string(),
            params,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run between sends.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn params(&self) -> &DispatchParams {
        &self.params
    }

    /// Run to completion, cancellation, or abort.
    ///
    /// The transport is closed before returning on every path. An aborted run
    /// returns `DispatchAborted` carrying the partial outcome.
    pub async fn run<T: Transport>(
        &self,
        mut synthesizer: EventSynthesizer,
        mut transport: T,
    ) -> Result<DispatchOutcome, PublisherError> {
        let started = Instant::now();
        let mut outcome = DispatchOutcome::default();

        match self.params.count {
            RunLength::Bounded(n) => {
                info!("Producing {n} log events to topic '{}'", self.topic)
            }
            RunLength::Continuous => info!(
                "Producing log events to topic '{}' until cancelled",
                self.topic
            ),
        }

        let result = self
            .drive(&mut synthesizer, &mut transport, &mut outcome)
            .await;
        transport.close().await;
        outcome.elapsed = started.elapsed();

        match result {
            Ok(()) => {
                info!("Dispatch finished: {outcome}");
                Ok(outcome)
            }
            Err(reason) => {
                warn!("Dispatch aborted: {reason} ({outcome})");
                Err(PublisherError::DispatchAborted { reason, outcome })
            }
        }
    }

    // Returns the abort reason on systemic failure.
    async fn drive<T: Transport>(
        &self,
        synthesizer: &mut EventSynthesizer,
        transport: &mut T,
        outcome: &mut DispatchOutcome,
    ) -> Result<(), String> {
        let mut consecutive_failures = 0u32;

        loop {
            if let RunLength::Bounded(n) = self.params.count {
                if outcome.attempted >= n {
                    return Ok(());
                }
            }
            if self.cancel.is_cancelled() {
                info!("Stopped by cancellation after {} records", outcome.attempted);
                return Ok(());
            }

            if outcome.attempted > 0 && !self.params.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        info!("Stopped by cancellation after {} records", outcome.attempted);
                        return Ok(());
                    }
                    _ = tokio::time::sleep(self.params.delay) => {}
                }
            }

            let event = synthesizer.next_event();
            outcome.attempted += 1;
            let seq = outcome.attempted;

            match self.publish(&event, transport).await {
                Ok(delivery) => {
                    outcome.acknowledged += 1;
                    consecutive_failures = 0;
                    self.report_progress(seq, &delivery);
                }
                Err(e) => {
                    outcome.failed += 1;
                    consecutive_failures += 1;
                    warn!("Error sending record {seq} ({}): {e}", event.request_id);

                    if e.is_systemic() {
                        return Err(e.to_string());
                    }
                    if self.params.abort_after > 0
                        && consecutive_failures >= self.params.abort_after
                    {
                        return Err(format!(
                            "{consecutive_failures} consecutive sends failed, last error: {e}"
                        ));
                    }
                }
            }
        }
    }

    async fn publish<T: Transport>(
        &self,
        event: &LogEvent,
        transport: &mut T,
    ) -> Result<Delivery, SendError> {
        let payload = event
            .to_payload()
            .map_err(|e| SendError::Rejected(format!("could not encode record: {e}")))?;

        let ack_timeout = self.params.ack_timeout;
        let mut backoff = self.params.retry.backoff;
        let mut retries = 0u32;
        loop {
            let send = transport.send(&self.topic, event.partition_key(), &payload, ack_timeout);
            let result = match tokio::time::timeout(ack_timeout, send).await {
                Ok(result) => result,
                Err(_) => Err(SendError::Timeout(ack_timeout)),
            };

            match result {
                Ok(delivery) => {
                    debug!(
                        "Published {} to partition {} offset {}",
                        event.request_id, delivery.partition, delivery.offset
                    );
                    return Ok(delivery);
                }
                Err(e)
                    if e.is_retriable()
                        && retries < self.params.retry.max_retries
                        && !self.cancel.is_cancelled() =>
                {
                    retries += 1;
                    debug!(
                        "Retrying {} ({retries}/{}) after {e}",
                        event.request_id, self.params.retry.max_retries
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(e),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn report_progress(&self, seq: u64, delivery: &Delivery) {
        match self.params.count {
            RunLength::Bounded(total) if seq % 10 == 0 || seq == total => info!(
                "  Sent {seq}/{total} events (partition: {}, offset: {})",
                delivery.partition, delivery.offset
            ),
            RunLength::Continuous if seq % 10 == 0 => info!(
                "  Sent {seq} events (partition: {}, offset: {})",
                delivery.partition, delivery.offset
            ),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_per_second() {
        let outcome = DispatchOutcome {
            attempted: 120,
            acknowledged: 100,
            failed: 20,
            elapsed: Duration::from_secs(10),
        };
        assert_eq!(outcome.records_per_second(), 10.0);
        assert_eq!(DispatchOutcome::default().records_per_second(), 0.0);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = DispatchOutcome {
            attempted: 5,
            acknowledged: 3,
            failed: 2,
            elapsed: Duration::from_secs(1),
        };
        let text = outcome.to_string();
        assert!(text.starts_with("attempted=5 acknowledged=3 failed=2"));
    }

    #[test]
    fn test_params_builders() {
        let params = DispatchParams::bounded(50)
            .with_delay(Duration::from_millis(500))
            .with_ack_timeout(Duration::from_secs(2))
            .with_abort_after(3);
        assert_eq!(params.count, RunLength::Bounded(50));
        assert_eq!(params.ack_timeout, Duration::from_secs(2));
        assert_eq!(params.delay, Duration::from_millis(500));
        assert_eq!(params.abort_after, 3);
        assert_eq!(params.retry, RetryPolicy::none());
        assert_eq!(DispatchParams::continuous().count, RunLength::Continuous);
    }
}
