use serde_json::Value;
use thiserror::Error;

/// Top-level error type for the `fleetgate-api` crate.
///
/// Every HTTP failure keeps the server's status and raw payload so callers
/// can render the server-supplied message. The type is `Clone` because a
/// single settled request result is handed to every waiter that shared it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The server could not be reached (DNS, connect, reset, timeout).
    #[error("network error: {message}")]
    Network { message: String, timed_out: bool },

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Authorization ───────────────────────────────────────────────
    /// HTTP 403. Handled by the reauthentication protocol; callers only
    /// see it when a replayed request is rejected again.
    #[error("authorization rejected (HTTP 403)")]
    Forbidden { data: Value },

    /// The refresh call itself was rejected with 403.
    #[error("{message}")]
    SessionExpired { message: String, data: Value },

    // ── Server responses ────────────────────────────────────────────
    /// Any other 4xx response (validation, not found, conflict, ...).
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        data: Value,
    },

    /// 5xx response.
    #[error("server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        data: Value,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Classify a non-success HTTP status and its payload.
    pub fn from_status(status: u16, data: Value) -> Self {
        match status {
            403 => Self::Forbidden { data },
            500..=599 => Self::Server {
                status,
                message: payload_message(&data).unwrap_or_else(|| format!("HTTP {status}")),
                data,
            },
            _ => Self::Rejected {
                status,
                message: payload_message(&data).unwrap_or_else(|| format!("HTTP {status}")),
                data,
            },
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Forbidden { .. } | Self::SessionExpired { .. } => Some(403),
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Network { .. } | Self::InvalidUrl(_) | Self::Deserialization { .. } => None,
        }
    }

    /// The raw error payload returned by the server, if any.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Forbidden { data }
            | Self::SessionExpired { data, .. }
            | Self::Rejected { data, .. }
            | Self::Server { data, .. } => Some(data),
            Self::Network { .. } | Self::InvalidUrl(_) | Self::Deserialization { .. } => None,
        }
    }

    /// Returns `true` for the 403 that triggers a token refresh.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns `true` if the refresh protocol gave up on the session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Returns `true` if re-issuing the same request might succeed.
    ///
    /// Nothing in this crate retries automatically; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }

    /// Returns `true` for an HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}

/// Pull a human-readable message out of an error payload.
///
/// Servers answer with `{"message": "..."}`, `{"error": "..."}` or a bare
/// string body; anything else yields `None`.
pub(crate) fn payload_message(data: &Value) -> Option<String> {
    match data {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_status_classifies_forbidden() {
        let err = Error::from_status(403, json!({"message": "jwt expired"}));
        assert!(err.is_forbidden());
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn from_status_keeps_server_message() {
        let err = Error::from_status(422, json!({"message": "plate already registered"}));
        match err {
            Error::Rejected {
                status, message, ..
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "plate already registered");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn from_status_server_error_without_message() {
        let err = Error::from_status(502, Value::Null);
        assert!(matches!(err, Error::Server { status: 502, ref message, .. } if message == "HTTP 502"));
        assert!(err.is_transient());
    }

    #[test]
    fn payload_message_reads_error_field_and_strings() {
        assert_eq!(
            payload_message(&json!({"error": "bad token"})).as_deref(),
            Some("bad token")
        );
        assert_eq!(payload_message(&json!("plain")).as_deref(), Some("plain"));
        assert_eq!(payload_message(&json!([1, 2])), None);
    }
}
