//! Command-line arguments.

use crate::delay::parse_delay;
use clap::Parser;
use log_publish_kafka::{ConfigOverrides, DispatchParams};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "kafka-log-generator")]
#[command(about = "Generate synthetic application log events and publish them to Kafka")]
#[command(long_about = None)]
pub struct Cli {
    /// Kafka brokers, comma-separated host:port (env: KAFKA_BROKERS)
    #[arg(long)]
    pub brokers: Option<String>,

    /// Target topic (env: KAFKA_TOPIC)
    #[arg(long)]
    pub topic: Option<String>,

    /// Number of events to send
    #[arg(long, default_value = "10", conflicts_with = "continuous")]
    pub count: u64,

    /// Send until interrupted with Ctrl+C
    #[arg(long)]
    pub continuous: bool,

    /// Pause between sends: seconds ("0.5") or with a ms/s/m suffix ("250ms")
    #[arg(long, default_value = "0", value_parser = parse_delay)]
    pub delay: Duration,

    /// Check broker reachability and write permission, then exit
    #[arg(long)]
    pub test_connection: bool,

    /// PLAINTEXT, SSL, SASL_PLAINTEXT or SASL_SSL (env: KAFKA_SECURITY_PROTOCOL)
    #[arg(long)]
    pub security_protocol: Option<String>,

    /// PLAIN, SCRAM-SHA-256, SCRAM-SHA-512, GSSAPI or OAUTHBEARER
    /// (env: KAFKA_SASL_MECHANISM)
    #[arg(long)]
    pub sasl_mechanism: Option<String>,

    /// SASL username (env: KAFKA_SASL_USERNAME)
    #[arg(long)]
    pub sasl_username: Option<String>,

    /// SASL password (env: KAFKA_SASL_PASSWORD)
    #[arg(long)]
    pub sasl_password: Option<String>,

    /// Random seed for reproducible events (same seed = same events)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-step timeout of the connection test
    #[arg(long, default_value = "10s", value_parser = parse_delay)]
    pub probe_timeout: Duration,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            brokers: self.brokers.clone(),
            topic: self.topic.clone(),
            security_protocol: self.security_protocol.clone(),
            sasl_mechanism: self.sasl_mechanism.clone(),
            sasl_username: self.sasl_username.clone(),
            sasl_password: self.sasl_password.clone(),
        }
    }

    pub fn dispatch_params(&self) -> DispatchParams {
        let params = if self.continuous {
            DispatchParams::continuous()
        } else {
            DispatchParams::bounded(self.count)
        };
        params.with_delay(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log_publish_kafka::RunLength;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["kafka-log-generator"]).unwrap();
        let params = cli.dispatch_params();
        assert_eq!(params.count, RunLength::Bounded(10));
        assert_eq!(params.delay, Duration::ZERO);
        assert_eq!(cli.probe_timeout, Duration::from_secs(10));
        assert!(!cli.test_connection);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn test_continuous_with_delay() {
        let cli = Cli::try_parse_from([
            "kafka-log-generator",
            "--continuous",
            "--delay",
            "250ms",
            "--seed",
            "7",
        ])
        .unwrap();
        let params = cli.dispatch_params();
        assert_eq!(params.count, RunLength::Continuous);
        assert_eq!(params.delay, Duration::from_millis(250));
        assert_eq!(cli.seed, Some(7));
    }

    #[test]
    fn test_count_conflicts_with_continuous() {
        let result =
            Cli::try_parse_from(["kafka-log-generator", "--count", "5", "--continuous"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_delay_is_rejected() {
        assert!(Cli::try_parse_from(["kafka-log-generator", "--delay", "soon"]).is_err());
    }

    #[test]
    fn test_overrides_carry_flags() {
        let cli = Cli::try_parse_from([
            "kafka-log-generator",
            "--brokers",
            "kafka:9092",
            "--security-protocol",
            "SASL_SSL",
            "--sasl-password",
            "secret",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.brokers.as_deref(), Some("kafka:9092"));
        assert_eq!(overrides.security_protocol.as_deref(), Some("SASL_SSL"));
        assert_eq!(overrides.sasl_password.as_deref(), Some("secret"));
        assert!(overrides.topic.is_none());
    }
}
