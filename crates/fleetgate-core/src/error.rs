// ── Core error types ──
//
// User-facing errors from fleetgate-core. Failures are grouped by what the
// caller can do about them; server responses keep their HTTP status and raw
// payload so the UI can render the server's own message.

use serde_json::Value;
use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` because one settled query result is handed to every subscriber
/// that shared the request.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the server: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    // ── Authorization errors ─────────────────────────────────────────
    /// The token refresh was rejected; the user must log in again.
    #[error("{message}")]
    SessionExpired { message: String, data: Value },

    /// A request was still rejected after reauthentication.
    #[error("Authorization rejected by the server")]
    Forbidden { data: Value },

    // ── API errors ───────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        status: u16,
        /// Raw error payload as returned by the server.
        data: Value,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected response: {message}")]
    Decode { message: String },

    #[error("Invalid arguments for {endpoint}: {message}")]
    InvalidArgument { endpoint: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Gateway shut down before the request settled")]
    Disconnected,
}

impl CoreError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired { .. } | Self::Forbidden { .. } => Some(403),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw server payload, if there was one.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::SessionExpired { data, .. } | Self::Forbidden { data } | Self::Api { data, .. } => {
                Some(data)
            }
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Whether re-issuing the same query might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetgate_api::Error> for CoreError {
    fn from(err: fleetgate_api::Error) -> Self {
        use fleetgate_api::Error as Api;

        match err {
            Api::Network {
                message,
                timed_out: true,
            } => CoreError::Timeout { message },
            Api::Network { message, .. } => CoreError::ConnectionFailed { message },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Forbidden { data } => CoreError::Forbidden { data },
            Api::SessionExpired { message, data } => CoreError::SessionExpired { message, data },
            Api::Rejected {
                status,
                message,
                data,
            }
            | Api::Server {
                status,
                message,
                data,
            } => CoreError::Api {
                message,
                status,
                data,
            },
            Api::Deserialization { message, body: _ } => CoreError::Decode { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_errors_keep_status_and_payload() {
        let err = CoreError::from(fleetgate_api::Error::from_status(
            422,
            json!({ "message": "plate is required" }),
        ));
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.data().map(|d| d["message"].clone()), Some(json!("plate is required")));
        assert_eq!(err.to_string(), "API error (HTTP 422): plate is required");
        assert!(!err.is_transient());
    }

    #[test]
    fn session_expired_displays_user_message() {
        let err = CoreError::from(fleetgate_api::Error::SessionExpired {
            message: "Your session has expired. Please log in again.".into(),
            data: json!({}),
        });
        assert!(err.is_session_expired());
        assert_eq!(err.to_string(), "Your session has expired. Please log in again.");
    }

    #[test]
    fn network_errors_are_transient() {
        let timeout = CoreError::from(fleetgate_api::Error::Network {
            message: "deadline".into(),
            timed_out: true,
        });
        assert!(matches!(timeout, CoreError::Timeout { .. }));
        assert!(timeout.is_transient());
        assert!(CoreError::from(fleetgate_api::Error::from_status(404, json!(null))).is_not_found());
    }
}
