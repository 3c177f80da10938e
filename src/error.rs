//! Error taxonomy for the PayWallet client core.
//!
//! Network failures are reported as [`TransportError`], which is `Clone` so a
//! single in-flight request can hand the same failure to every waiter.
//! [`Error`] wraps it with the context of the operation that failed.

use serde::Deserialize;

use crate::cache::Endpoint;

/// Failure of a single request against the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (connect, timeout, TLS...).
    #[error("request to {path} failed: {message}")]
    Network { path: String, message: String },

    /// The server answered with a non-success status.
    #[error("server returned {status} for {path}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl TransportError {
    /// HTTP status, if the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided message (or the transport's own description).
    pub fn message(&self) -> &str {
        match self {
            TransportError::Network { message, .. }
            | TransportError::Status { message, .. }
            | TransportError::Decode { message, .. } => message,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Blocked before submission: an empty email or password.
    #[error("{0} is required")]
    MissingCredentials(&'static str),

    /// The login request was rejected.
    #[error("login failed: {message}")]
    AuthenticationFailure { status: Option<u16>, message: String },

    /// A write (approve/suspend/block/unblock) failed. The cache is unchanged.
    #[error("{endpoint} failed: {source}")]
    MutationFailure {
        endpoint: Endpoint,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request the endpoint table cannot express (wrong kind, missing id).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The current role may not use the requested dashboard scope.
    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error body returned by the backend, e.g. `{"success":false,"message":"..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extract a human-readable message from a raw error body.
    pub fn message_from(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    "no response body".to_string()
                } else {
                    body.trim().to_string()
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_prefers_message_field() {
        let msg = ErrorBody::message_from(r#"{"success":false,"message":"Invalid password"}"#);
        assert_eq!(msg, "Invalid password");
    }

    #[test]
    fn test_error_body_falls_back_to_raw_text() {
        assert_eq!(ErrorBody::message_from("Bad Gateway"), "Bad Gateway");
        assert_eq!(ErrorBody::message_from("  "), "no response body");
        assert_eq!(ErrorBody::message_from(r#"{"message":""}"#), r#"{"message":""}"#);
    }

    #[test]
    fn test_transport_error_accessors() {
        let err = TransportError::Status {
            path: "/admin/agents".to_string(),
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.message(), "Forbidden");

        let err = TransportError::Network {
            path: "/admin/agents".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_mutation_failure_display_names_endpoint() {
        let err = Error::MutationFailure {
            endpoint: Endpoint::SuspendUser,
            source: TransportError::Status {
                path: "/admin/suspend-agent/a1".to_string(),
                status: 500,
                message: "boom".to_string(),
            },
        };
        assert!(err.to_string().starts_with("suspendUser failed"));
    }
}
