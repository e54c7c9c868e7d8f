//! Connection configuration and its resolution from environment and
//! explicit overrides.

use crate::error::PublisherError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const ENV_BROKERS: &str = "KAFKA_BROKERS";
pub const ENV_TOPIC: &str = "KAFKA_TOPIC";
pub const ENV_SECURITY_PROTOCOL: &str = "KAFKA_SECURITY_PROTOCOL";
pub const ENV_SASL_MECHANISM: &str = "KAFKA_SASL_MECHANISM";
pub const ENV_SASL_USERNAME: &str = "KAFKA_SASL_USERNAME";
pub const ENV_SASL_PASSWORD: &str = "KAFKA_SASL_PASSWORD";

/// Transport security for broker connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityProtocol {
    #[default]
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl SecurityProtocol {
    pub fn uses_sasl(&self) -> bool {
        matches!(self, SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl)
    }

    /// Value for librdkafka's `security.protocol`.
    pub fn as_rdkafka_str(&self) -> &'static str {
        match self {
            SecurityProtocol::Plaintext => "plaintext",
            SecurityProtocol::Ssl => "ssl",
            SecurityProtocol::SaslPlaintext => "sasl_plaintext",
            SecurityProtocol::SaslSsl => "sasl_ssl",
        }
    }
}

impl FromStr for SecurityProtocol {
    type Err = PublisherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "plaintext" => Ok(SecurityProtocol::Plaintext),
            "ssl" | "tls" => Ok(SecurityProtocol::Ssl),
            "sasl_plaintext" => Ok(SecurityProtocol::SaslPlaintext),
            "sasl_ssl" | "sasl_tls" => Ok(SecurityProtocol::SaslSsl),
            other => Err(PublisherError::config(format!(
                "unknown security protocol '{other}' (expected plaintext, ssl, sasl_plaintext or sasl_ssl)"
            ))),
        }
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_rdkafka_str().to_ascii_uppercase())
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaslMechanism {
    Plain,
    ScramSha256,
    ScramSha512,
    Gssapi,
    OauthBearer,
}

impl SaslMechanism {
    pub fn as_rdkafka_str(&self) -> &'static str {
        match self {
            SaslMechanism::Plain => "PLAIN",
            SaslMechanism::ScramSha256 => "SCRAM-SHA-256",
            SaslMechanism::ScramSha512 => "SCRAM-SHA-512",
            SaslMechanism::Gssapi => "GSSAPI",
            SaslMechanism::OauthBearer => "OAUTHBEARER",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = PublisherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "PLAIN" => Ok(SaslMechanism::Plain),
            "SCRAM-SHA-256" => Ok(SaslMechanism::ScramSha256),
            "SCRAM-SHA-512" => Ok(SaslMechanism::ScramSha512),
            "GSSAPI" => Ok(SaslMechanism::Gssapi),
            "OAUTHBEARER" => Ok(SaslMechanism::OauthBearer),
            other => Err(PublisherError::config(format!(
                "unknown SASL mechanism '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_rdkafka_str())
    }
}

/// SASL mechanism and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SaslAuth {
    pub mechanism: SaslMechanism,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SaslAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslAuth")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolved, validated connection settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    brokers: Vec<String>,
    topic: String,
    security_protocol: SecurityProtocol,
    sasl: Option<SaslAuth>,
}

impl Configuration {
    pub fn brokers(&self) -> &[String] {
        &self.brokers
    }

    /// Brokers joined for `bootstrap.servers`.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn security_protocol(&self) -> SecurityProtocol {
        self.security_protocol
    }

    pub fn sasl(&self) -> Option<&SaslAuth> {
        self.sasl.as_ref()
    }
}

/// Values supplied explicitly, typically from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub brokers: Option<String>,
    pub topic: Option<String>,
    pub security_protocol: Option<String>,
    pub sasl_mechanism: Option<String>,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
}

/// Merge `env` and `overrides` into a validated [`Configuration`].
///
/// Overrides win over environment values, which win over defaults. Blank
/// values count as absent.
pub fn resolve(
    env: &HashMap<String, String>,
    overrides: &ConfigOverrides,
) -> Result<Configuration, PublisherError> {
    let pick = |explicit: &Option<String>, name: &str| -> Option<String> {
        non_blank(explicit.as_deref())
            .or_else(|| non_blank(env.get(name).map(String::as_str)))
            .map(str::to_string)
    };

    let brokers = pick(&overrides.brokers, ENV_BROKERS).ok_or_else(|| {
        PublisherError::config(format!("--brokers is required (or set {ENV_BROKERS})"))
    })?;
    let brokers = parse_brokers(&brokers)?;

    let topic = pick(&overrides.topic, ENV_TOPIC)
        .map(|topic| topic.trim().to_string())
        .ok_or_else(|| {
            PublisherError::config(format!("--topic is required (or set {ENV_TOPIC})"))
        })?;

    let security_protocol = match pick(&overrides.security_protocol, ENV_SECURITY_PROTOCOL) {
        Some(value) => value.parse()?,
        None => SecurityProtocol::default(),
    };

    let sasl = if security_protocol.uses_sasl() {
        let mechanism: SaslMechanism = pick(&overrides.sasl_mechanism, ENV_SASL_MECHANISM)
            .ok_or_else(|| {
                PublisherError::config(format!(
                    "SASL mechanism is required for {security_protocol} (use --sasl-mechanism or set {ENV_SASL_MECHANISM})"
                ))
            })?
            .parse()?;
        let username = pick(&overrides.sasl_username, ENV_SASL_USERNAME);
        let password = pick(&overrides.sasl_password, ENV_SASL_PASSWORD);
        match (username, password) {
            (Some(username), Some(password)) => Some(SaslAuth {
                mechanism,
                username,
                password,
            }),
            _ => {
                return Err(PublisherError::config(format!(
                    "username and password are required for {mechanism} (set {ENV_SASL_USERNAME} and {ENV_SASL_PASSWORD})"
                )))
            }
        }
    } else {
        None
    };

    Ok(Configuration {
        brokers,
        topic,
        security_protocol,
        sasl,
    })
}

// Whitespace-only counts as absent; the value itself is returned as given so
// credentials keep any surrounding whitespace.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_brokers(value: &str) -> Result<Vec<String>, PublisherError> {
    let brokers: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect();

    if brokers.is_empty() {
        return Err(PublisherError::config("broker list is empty"));
    }

    for broker in &brokers {
        let valid = broker
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(PublisherError::config(format!(
                "invalid broker address '{broker}' (expected host:port)"
            )));
        }
    }

    Ok(brokers)
}
