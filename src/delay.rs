//! Delay parsing utilities.

use anyhow::Context;
use std::time::Duration;

/// Parse a delay string like "0.5", "250ms", "2s" or "1m".
/// Supports:
/// - Plain numbers (interpreted as seconds, fractions allowed): "0.5"
/// - Milliseconds suffix: "250ms"
/// - Seconds suffix: "2s"
/// - Minutes suffix: "1m"
pub fn parse_delay(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty delay string");
    }

    // "ms" must be checked before "s" and "m"
    let (num_str, scale, unit) = if let Some(num_str) = s.strip_suffix("ms") {
        (num_str, 0.001, "milliseconds")
    } else if let Some(num_str) = s.strip_suffix('s') {
        (num_str, 1.0, "seconds")
    } else if let Some(num_str) = s.strip_suffix('m') {
        (num_str, 60.0, "minutes")
    } else {
        (s, 1.0, "seconds")
    };

    let value: f64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid {unit} value: {num_str}"))?;
    if value.is_sign_negative() {
        anyhow::bail!("Delay must not be negative: {s}");
    }

    Duration::try_from_secs_f64(value * scale).with_context(|| format!("Delay out of range: {s}"))
}
