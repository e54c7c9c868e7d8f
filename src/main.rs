//! Command-line interface for kafka-log-generator
//!
//! # Usage Examples
//!
//! ```bash
//! # Send 10 events to the local broker
//! kafka-log-generator --brokers localhost:9092 --topic application-logs
//!
//! # Reproducible run, one event every 250ms
//! kafka-log-generator --count 100 --delay 250ms --seed 42
//!
//! # Stream until Ctrl+C
//! kafka-log-generator --continuous --delay 0.5
//!
//! # Check connectivity against a SASL_SSL cluster
//! KAFKA_SASL_PASSWORD=... kafka-log-generator --test-connection \
//!   --brokers broker-1:9093 --security-protocol SASL_SSL \
//!   --sasl-mechanism SCRAM-SHA-512 --sasl-username producer
//! ```
//!
//! Exit codes: 0 success, 2 configuration error, 3 no broker reachable,
//! 4 write not permitted, 5 dispatch aborted, 1 anything else.

mod cli;
mod delay;

use clap::Parser;
use cli::Cli;
use log_event_generator::EventSynthesizer;
use log_publish_kafka::{
    resolve, Configuration, ConnectivityProbe, DispatchOutcome, Dispatcher, Finding,
    KafkaTransport, PublisherError, Transport,
};
use std::collections::HashMap;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<PublisherError>()
        .map_or(1, PublisherError::exit_code)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let config = resolve(&env, &cli.overrides())?;
    info!(
        brokers = %config.bootstrap_servers(),
        topic = config.topic(),
        security_protocol = %config.security_protocol(),
        sasl = config.sasl().is_some(),
        "Resolved Kafka configuration"
    );

    if cli.test_connection {
        test_connection(&config, &cli).await
    } else {
        dispatch(&config, &cli).await
    }
}

async fn test_connection(config: &Configuration, cli: &Cli) -> anyhow::Result<()> {
    let mut transport = KafkaTransport::connect(config)?;
    let probe = ConnectivityProbe::new(cli.probe_timeout);

    let result = probe.run(config, &mut transport).await;
    transport.close().await;
    let result = result?;

    for finding in result.findings() {
        match finding {
            Finding::TopicMissing { topic } => {
                warn!("Topic '{topic}' does not exist yet; enable auto-creation or create it")
            }
        }
    }
    result.verdict()?;

    println!(
        "Connection test passed: {} broker(s) reachable, topic '{}' writable",
        result.broker_count(),
        result.topic
    );
    Ok(())
}

async fn dispatch(config: &Configuration, cli: &Cli) -> anyhow::Result<()> {
    let synthesizer = EventSynthesizer::with_seed(cli.seed);
    if let Some(seed) = synthesizer.seed() {
        info!("Using seed {seed}");
    }

    let transport = KafkaTransport::connect(config)?;
    let dispatcher = Dispatcher::new(config, cli.dispatch_params());

    let cancel = dispatcher.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt signal (Ctrl+C), stopping after the in-flight send");
                cancel.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {e}"),
        }
    });

    let result = dispatcher.run(synthesizer, transport).await;
    if let Some(line) = summary(&result) {
        println!("{line}");
    }
    result.map(|_| ()).map_err(Into::into)
}

/// Final outcome line, printed for completed and aborted runs alike.
fn summary(result: &Result<DispatchOutcome, PublisherError>) -> Option<String> {
    match result {
        Ok(outcome) => Some(format!("Done: {outcome}")),
        Err(e) => e.outcome().map(|outcome| format!("Stopped early: {outcome}")),
    }
}
