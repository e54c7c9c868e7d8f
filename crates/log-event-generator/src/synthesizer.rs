//! The event synthesizer.

use crate::catalog::{self, Message, Service, SERVICES};
use crate::distribution::choose_uniform;
use crate::event::{Level, LogEvent, Metrics};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces a lazy stream of synthetic log events.
///
/// With a seed the sequence of levels, services, request ids, messages and
/// metrics is reproducible: two synthesizers built from the same seed yield
/// the same events apart from their timestamps. Timestamps come from the
/// wall clock and never go backwards within one synthesizer.
pub struct EventSynthesizer {
    /// Seed used for the RNG, `None` when seeded from entropy
    seed: Option<u64>,
    rng: StdRng,
    /// Per-run tag embedded in request ids
    run_tag: u32,
    /// Number of events produced so far
    index: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl EventSynthesizer {
    /// Create a deterministic synthesizer.
    pub fn new(seed: u64) -> Self {
        Self::from_rng(Some(seed), StdRng::seed_from_u64(seed))
    }

    /// Create a synthesizer seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::from_rng(None, StdRng::from_entropy())
    }

    /// Seeded when `seed` is given, entropy-seeded otherwise.
    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(seed),
            None => Self::from_entropy(),
        }
    }

    fn from_rng(seed: Option<u64>, mut rng: StdRng) -> Self {
        let run_tag = rng.gen();
        Self {
            seed,
            rng,
            run_tag,
            index: 0,
            last_timestamp: None,
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of events generated so far.
    pub fn current_index(&self) -> u64 {
        self.index
    }

    /// Generate the next event.
    pub fn next_event(&mut self) -> LogEvent {
        let index = self.index;
        self.index += 1;

        let level = *catalog::LEVELS.sample(&mut self.rng);
        let service: &Service = choose_uniform(&mut self.rng, SERVICES);
        let host = *choose_uniform(&mut self.rng, service.hosts);
        let message: &Message = choose_uniform(&mut self.rng, catalog::messages_for(level));

        let metrics = message.request.then(|| self.metrics(level));

        let mut event = LogEvent {
            timestamp: self.next_timestamp(),
            level,
            service: service.name,
            host,
            request_id: format!("req-{:08x}-{:06}", self.run_tag, index),
            message: message.text,
            error: message.error,
            user_id: None,
            ip_address: None,
            amount: None,
            metrics,
        };
        self.enrich(&mut event);
        event
    }

    /// Iterator over the next `count` events.
    pub fn events(&mut self, count: u64) -> LogEvents<'_> {
        LogEvents {
            synthesizer: self,
            remaining: count,
        }
    }

    fn metrics(&mut self, level: Level) -> Metrics {
        let (min, max) = catalog::duration_range_ms(level);
        Metrics {
            duration_ms: self.rng.gen_range(min..=max),
            status_code: *catalog::status_codes(level).sample(&mut self.rng),
        }
    }

    // Optional fields, with per-level and per-service probabilities.
    fn enrich(&mut self, event: &mut LogEvent) {
        match event.level {
            Level::Info => {
                if self.rng.gen_bool(0.7) {
                    event.user_id = Some(self.user_id());
                }
                if event.service == "web-api" && self.rng.gen_bool(0.5) {
                    event.ip_address = Some(format!(
                        "192.168.{}.{}",
                        self.rng.gen_range(1..=255u8),
                        self.rng.gen_range(1..=255u8)
                    ));
                }
                if event.service == "payment-service" && self.rng.gen_bool(0.3) {
                    let amount: f64 = self.rng.gen_range(9.99..=999.99);
                    event.amount = Some((amount * 100.0).round() / 100.0);
                }
            }
            Level::Warn => {
                if self.rng.gen_bool(0.4) {
                    event.user_id = Some(self.user_id());
                }
            }
            Level::Error => {}
        }
    }

    fn user_id(&mut self) -> String {
        format!("user-{}", self.rng.gen_range(10_000..=99_999u32))
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

/// Unbounded stream, used by continuous mode.
impl Iterator for EventSynthesizer {
    type Item = LogEvent;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_event())
    }
}

/// Iterator that lazily generates a fixed number of events.
pub struct LogEvents<'a> {
    synthesizer: &'a mut EventSynthesizer,
    remaining: u64,
}

impl Iterator for LogEvents<'_> {
    type Item = LogEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.synthesizer.next_event())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LogEvents<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fingerprint(event: &LogEvent) -> (Level, &'static str, String, &'static str) {
        (
            event.level,
            event.service,
            event.request_id.clone(),
            event.message,
        )
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut gen1 = EventSynthesizer::new(42);
        let mut gen2 = EventSynthesizer::new(42);

        let a: Vec<_> = gen1.events(200).collect();
        let b: Vec<_> = gen2.events(200).collect();

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(fingerprint(x), fingerprint(y));
            assert_eq!(x.metrics, y.metrics);
            assert_eq!(x.host, y.host);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a: Vec<_> = EventSynthesizer::new(1).events(50).map(|e| e.request_id).collect();
        let b: Vec<_> = EventSynthesizer::new(2).events(50).map(|e| e.request_id).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_level_distribution() {
        let mut generator = EventSynthesizer::new(1234);
        let n = 5_000;
        let (mut info, mut warn, mut error) = (0usize, 0usize, 0usize);
        for event in generator.events(n) {
            match event.level {
                Level::Info => info += 1,
                Level::Warn => warn += 1,
                Level::Error => error += 1,
            }
        }
        let share = |c: usize| c as f64 / n as f64;
        assert!((share(info) - 0.70).abs() < 0.05, "INFO {}", share(info));
        assert!((share(warn) - 0.20).abs() < 0.05, "WARN {}", share(warn));
        assert!((share(error) - 0.10).abs() < 0.05, "ERROR {}", share(error));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let mut generator = EventSynthesizer::new(9);
        let ids: HashSet<String> = generator.events(10_000).map(|e| e.request_id).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_index_advances() {
        let mut generator = EventSynthesizer::new(3);
        assert_eq!(generator.current_index(), 0);
        generator.next_event();
        generator.next_event();
        assert_eq!(generator.current_index(), 2);
        assert_eq!(generator.events(5).len(), 5);
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let events: Vec<_> = EventSynthesizer::new(5).events(500).collect();
        for pair in events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_metrics_follow_level() {
        let mut generator = EventSynthesizer::new(77);
        let mut error_5xx = 0usize;
        let mut error_total = 0usize;
        for event in generator.events(3_000) {
            let Some(metrics) = event.metrics else {
                assert_ne!(event.level, Level::Error, "ERROR events are request-style");
                continue;
            };
            match event.level {
                Level::Info => {
                    assert!((10..=500).contains(&metrics.duration_ms));
                    assert!((200..300).contains(&metrics.status_code));
                }
                Level::Warn => {
                    assert!((500..=2000).contains(&metrics.duration_ms));
                }
                Level::Error => {
                    assert!((1000..=10000).contains(&metrics.duration_ms));
                    assert!(event.error.is_some());
                    error_total += 1;
                    if metrics.status_code >= 500 {
                        error_5xx += 1;
                    }
                }
            }
        }
        assert!(error_total > 0);
        assert!(error_5xx as f64 / error_total as f64 > 0.75);
    }

    #[test]
    fn test_enrichment_respects_service() {
        for event in EventSynthesizer::new(11).events(2_000) {
            if event.ip_address.is_some() {
                assert_eq!(event.service, "web-api");
            }
            if let Some(amount) = event.amount {
                assert_eq!(event.service, "payment-service");
                assert!((9.99..=999.99).contains(&amount));
            }
            if event.level == Level::Error {
                assert!(event.user_id.is_none());
            }
        }
    }

    #[test]
    fn test_unbounded_iterator() {
        let generator = EventSynthesizer::from_entropy();
        assert!(generator.seed().is_none());
        assert_eq!(generator.take(25).count(), 25);
    }
}
