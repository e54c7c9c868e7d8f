//! Fixed vocabularies the synthesizer draws from.

use crate::distribution::CumulativeTable;
use crate::event::Level;

/// A service and the hosts it runs on.
#[derive(Debug, Clone, Copy)]
pub struct Service {
    pub name: &'static str,
    pub hosts: &'static [&'static str],
}

pub const SERVICES: &[Service] = &[
    Service {
        name: "web-api",
        hosts: &["api-server-01", "api-server-02", "api-server-03"],
    },
    Service {
        name: "auth-service",
        hosts: &["auth-server-01", "auth-server-02"],
    },
    Service {
        name: "db-service",
        hosts: &["db-server-01"],
    },
    Service {
        name: "payment-service",
        hosts: &["payment-server-01", "payment-server-02"],
    },
    Service {
        name: "inventory-service",
        hosts: &["inventory-server-01", "inventory-server-02"],
    },
    Service {
        name: "notification-service",
        hosts: &["notif-server-01"],
    },
    Service {
        name: "search-service",
        hosts: &["search-server-01", "search-server-02"],
    },
    Service {
        name: "analytics-service",
        hosts: &["analytics-server-01"],
    },
];

/// INFO 70%, WARN 20%, ERROR 10%.
pub const LEVELS: CumulativeTable<Level> = CumulativeTable::new(&[
    (Level::Info, 0.70),
    (Level::Warn, 0.90),
    (Level::Error, 1.00),
]);

/// A message template. `request` marks request-style events, the only ones
/// that carry a metrics sub-object.
#[derive(Debug, Clone, Copy)]
pub struct Message {
    pub text: &'static str,
    pub request: bool,
    pub error: Option<&'static str>,
}

const fn request(text: &'static str) -> Message {
    Message {
        text,
        request: true,
        error: None,
    }
}

const fn background(text: &'static str) -> Message {
    Message {
        text,
        request: false,
        error: None,
    }
}

const fn failure(text: &'static str, error: &'static str) -> Message {
    Message {
        text,
        request: true,
        error: Some(error),
    }
}

pub const INFO_MESSAGES: &[Message] = &[
    request("Request processed successfully"),
    request("User authentication successful"),
    request("GET /api/v1/products"),
    request("POST /api/v1/orders"),
    request("PUT /api/v1/cart"),
    request("DELETE /api/v1/cart/items"),
    request("GET /api/v1/users/profile"),
    request("Search query executed"),
    request("Payment processed"),
    background("Email notification sent"),
    background("SMS notification sent"),
    background("Daily report generated"),
    background("Cache refreshed successfully"),
    request("Session created"),
    request("File uploaded successfully"),
];

pub const WARN_MESSAGES: &[Message] = &[
    request("Query execution took longer than expected"),
    background("Low stock alert for product SKU-12345"),
    request("Multiple failed login attempts detected"),
    background("Connection pool nearly exhausted"),
    request("Payment declined"),
    request("Rate limit approaching threshold"),
    background("Memory usage above 80%"),
    background("Disk space running low"),
];

pub const ERROR_MESSAGES: &[Message] = &[
    failure("Database connection timeout", "ConnectionTimeout"),
    failure("Payment gateway timeout", "GatewayTimeout"),
    failure("Deadlock detected in transaction", "DeadlockDetected"),
    failure("Failed to update inventory count", "ConcurrencyException"),
    failure("Internal server error", "NullPointerException"),
    failure("Service unavailable", "ServiceUnavailable"),
    failure("Authentication failed", "AuthenticationError"),
    failure("Invalid input data", "ValidationError"),
];

pub fn messages_for(level: Level) -> &'static [Message] {
    match level {
        Level::Info => INFO_MESSAGES,
        Level::Warn => WARN_MESSAGES,
        Level::Error => ERROR_MESSAGES,
    }
}

static INFO_STATUS: CumulativeTable<u16> =
    CumulativeTable::new(&[(200, 0.80), (201, 0.92), (204, 1.00)]);

static WARN_STATUS: CumulativeTable<u16> =
    CumulativeTable::new(&[(200, 0.60), (402, 0.85), (429, 1.00)]);

static ERROR_STATUS: CumulativeTable<u16> =
    CumulativeTable::new(&[(500, 0.40), (503, 0.65), (504, 0.90), (409, 1.00)]);

/// Status code distribution for a level.
pub fn status_codes(level: Level) -> &'static CumulativeTable<u16> {
    match level {
        Level::Info => &INFO_STATUS,
        Level::Warn => &WARN_STATUS,
        Level::Error => &ERROR_STATUS,
    }
}

/// Inclusive request duration range in milliseconds for a level.
pub fn duration_range_ms(level: Level) -> (u32, u32) {
    match level {
        Level::Info => (10, 500),
        Level::Warn => (500, 2000),
        Level::Error => (1000, 10000),
    }
}
