//! Error taxonomy for the generation gateway.
//!
//! The pipeline itself never raises for soft failures (extraction misses,
//! validation failures) — those travel inside result records and drive the
//! retry loop. Only transport-level problems surface as [`GatewayError`], and
//! even those are caught at the per-attempt boundary and folded into the next
//! attempt's context unless the attempt budget is spent.

use std::error::Error;
use std::fmt;

/// Transport-level failure talking to the text-generation gateway, classified
/// into the small fixed set of categories the editor UI knows how to phrase.
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayError {
    /// HTTP 429 — the gateway asked us to slow down.
    RateLimited,
    /// HTTP 402, or a 403 whose body mentions quota/billing.
    QuotaExceeded,
    /// HTTP 401 or a non-quota 403 — key rejected.
    Unauthorized,
    /// Any 5xx from the gateway.
    Server(u16),
    /// Request never completed: DNS, connect, timeout, broken stream.
    Network(String),
    /// The gateway answered 2xx but the body was not the expected
    /// chat-completions shape.
    InvalidResponse(String),
    /// The client does not implement the requested call style.
    Unsupported(String),
}

impl GatewayError {
    /// Classify an HTTP error status (plus a body snippet for 403
    /// disambiguation) into a [`GatewayError`].
    pub fn from_status(status: u16, body: &str) -> GatewayError {
        match status {
            429 => GatewayError::RateLimited,
            402 => GatewayError::QuotaExceeded,
            403 if body.contains("quota") || body.contains("billing") => {
                GatewayError::QuotaExceeded
            }
            401 | 403 => GatewayError::Unauthorized,
            s if s >= 500 => GatewayError::Server(s),
            s => GatewayError::InvalidResponse(format!("unexpected status {}: {}", s, body)),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::RateLimited => write!(f, "gateway rate limit exceeded"),
            GatewayError::QuotaExceeded => write!(f, "gateway quota exhausted"),
            GatewayError::Unauthorized => write!(f, "gateway rejected the API key"),
            GatewayError::Server(status) => write!(f, "gateway server error (HTTP {})", status),
            GatewayError::Network(msg) => write!(f, "network error: {}", msg),
            GatewayError::InvalidResponse(msg) => write!(f, "invalid gateway response: {}", msg),
            GatewayError::Unsupported(msg) => write!(f, "unsupported operation: {}", msg),
        }
    }
}

impl Error for GatewayError {}
