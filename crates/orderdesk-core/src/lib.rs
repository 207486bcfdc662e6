//! Core domain types and error definitions for orderdesk.
//!
//! This crate provides the types shared by the server and its upstream
//! collaborators:
//!
//! - [`RawRecord`] and [`CanonicalOrderStatus`] — loosely-typed input and strict output
//! - [`normalize`] — the tolerant conversion between the two
//! - [`UpstreamError`] — typed failures from databases, functions and agent services
//! - [`LookupMode`] — exact or fuzzy customer matching
//!
//! # Example
//!
//! ```rust
//! use orderdesk_core::{normalize, RawRecord};
//!
//! let raw: RawRecord = serde_json::from_str(
//!     r#"{"customerName": "Ada", "mountPrice": "12.50", "balance": ""}"#,
//! ).unwrap();
//!
//! let status = normalize(&raw).unwrap();
//! assert_eq!(status.mount_price, 12.5);
//! assert_eq!(status.balance, 0.0);
//! assert_eq!(status.pickup_date, None);
//! ```

mod normalize;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use normalize::{normalize, CanonicalOrderStatus, NormalizeError, RawRecord, RawValue};

/// Reply used when an agent finishes without producing any text.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't get a response.";

/// Failures from a single call to an upstream collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The upstream could not be reached at all.
    #[error("upstream unreachable: {0}")]
    Connectivity(String),

    /// The request or agent run exceeded its deadline.
    #[error("upstream timed out")]
    Timeout,

    /// The upstream rejected the request with a 4xx status.
    #[error("upstream rejected request with status {status}: {body}")]
    ClientStatus { status: u16, body: String },

    /// The upstream failed with a 5xx status.
    #[error("upstream failed with status {status}: {body}")]
    ServerStatus { status: u16, body: String },

    /// The upstream answered, but not with the expected shape.
    #[error("malformed upstream payload: {0}")]
    Decode(String),

    /// An agent run reached a terminal status other than `completed`.
    #[error("agent run ended with status {status}: {detail}")]
    RunFailed { status: String, detail: String },

    /// Opening or querying the order database failed.
    #[error("database error: {0}")]
    Database(String),
}

impl UpstreamError {
    /// Classifies a non-success HTTP status code.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            400..=499 => UpstreamError::ClientStatus { status, body },
            _ => UpstreamError::ServerStatus { status, body },
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        UpstreamError::Decode(err.to_string())
    }
}

/// How a customer name is matched against stored orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// The stored name must equal the requested name.
    #[default]
    Exact,
    /// The requested name may appear anywhere in the stored name, ignoring case.
    Fuzzy,
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupMode::Exact => write!(f, "exact"),
            LookupMode::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

impl FromStr for LookupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(LookupMode::Exact),
            "fuzzy" => Ok(LookupMode::Fuzzy),
            other => Err(format!("expected `exact` or `fuzzy`, got `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            UpstreamError::from_status(403, "denied"),
            UpstreamError::ClientStatus { status: 403, body: "denied".into() }
        );
        assert_eq!(
            UpstreamError::from_status(503, ""),
            UpstreamError::ServerStatus { status: 503, body: String::new() }
        );
    }

    #[test]
    fn test_lookup_mode_parse() {
        assert_eq!("exact".parse::<LookupMode>().unwrap(), LookupMode::Exact);
        assert_eq!(" Fuzzy ".parse::<LookupMode>().unwrap(), LookupMode::Fuzzy);
        assert!("partial".parse::<LookupMode>().is_err());
        assert_eq!(LookupMode::default(), LookupMode::Exact);
    }
}
