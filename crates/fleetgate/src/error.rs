//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fleetgate_config::ConfigError;
use fleetgate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the API at {url}")]
    #[diagnostic(
        code(fleetgate::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(fleetgate::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.\n{message}")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fleetgate::auth_failed),
        help(
            "Verify your username and password.\n\
             Run: fleetgate config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("{message}")]
    #[diagnostic(
        code(fleetgate::session_expired),
        help("Log in again with: fleetgate login")
    )]
    SessionExpired { message: String },

    #[error("Permission denied")]
    #[diagnostic(
        code(fleetgate::forbidden),
        help("The logged-in user is not allowed to perform this operation.")
    )]
    Forbidden,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(fleetgate::no_credentials),
        help(
            "Configure credentials with: fleetgate config init\n\
             Or pass --username and set FLEETGATE_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fleetgate::not_found),
        help("Run: fleetgate {resource_type} list to see available records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(code(fleetgate::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({status}): {message}")]
    #[diagnostic(code(fleetgate::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(fleetgate::decode))]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fleetgate::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fleetgate::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fleetgate config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API configured")]
    #[diagnostic(
        code(fleetgate::no_config),
        help(
            "Create a profile with: fleetgate config init\n\
             Or pass --base-url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fleetgate::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fleetgate::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(fleetgate::json), help("Check the JSON body and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::SessionExpired { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::Forbidden => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::Json(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the resource and id to a 404 from a single-record call.
    pub fn for_record(err: CoreError, resource_type: &str, identifier: &str) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                resource_type: resource_type.into(),
                identifier: identifier.into(),
            }
        } else {
            err.into()
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { message } => CliError::ConnectionFailed {
                url: "(configured base URL)".into(),
                reason: message,
            },
            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "The gateway was shut down".into(),
            },
            CoreError::Timeout { message } => CliError::Timeout { message },
            CoreError::SessionExpired { message, .. } => CliError::SessionExpired { message },
            CoreError::Forbidden { .. } => CliError::Forbidden,
            CoreError::Api {
                status: 401,
                message,
                ..
            } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::Api {
                status: 409,
                message,
                ..
            } => CliError::Conflict { message },
            CoreError::Api {
                status, message, ..
            } => CliError::ApiError { status, message },
            CoreError::Decode { message } => CliError::Decode { message },
            CoreError::InvalidArgument { endpoint, message } => CliError::Validation {
                field: endpoint,
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
