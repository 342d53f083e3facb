// Authentication endpoints and token payloads.
//
// Login and refresh both answer with a token pair. Field names vary between
// backend versions (`accessToken`, `access_token`, `token`), so the payload
// accepts all of them.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Error;

/// Default user-facing message attached to a rejected refresh.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Paths and header names used by the reauthentication protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub login_path: String,
    pub refresh_path: String,
    pub logout_path: String,
    /// Side-channel header carrying the refresh token on the refresh call.
    pub refresh_header: String,
    pub session_expired_message: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            login_path: "auth/login".into(),
            refresh_path: "auth/refresh".into(),
            logout_path: "auth/logout".into(),
            refresh_header: "x-refresh-token".into(),
            session_expired_message: SESSION_EXPIRED_MESSAGE.into(),
        }
    }
}

/// Username/password login.
///
/// The identifier is sent as `email` when it looks like one, otherwise as
/// `username`.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: SecretString,
}

impl LoginRequest {
    pub fn new(identifier: impl Into<String>, password: SecretString) -> Self {
        Self {
            identifier: identifier.into(),
            password,
        }
    }

    pub(crate) fn body(&self) -> Value {
        let field = if self.identifier.contains('@') {
            "email"
        } else {
            "username"
        };
        json!({
            field: self.identifier,
            "password": self.password.expose_secret(),
        })
    }
}

/// Token pair returned by the login and refresh endpoints.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
    /// The authenticated user record, when the server includes it.
    pub user: Option<Value>,
}

#[derive(Deserialize)]
struct RawTokens {
    #[serde(alias = "accessToken", alias = "access_token", alias = "token")]
    access: String,
    #[serde(default, alias = "refreshToken", alias = "refresh_token")]
    refresh: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

impl TokenResponse {
    /// Decode a token payload, unwrapping a `{ "data": {...} }` envelope.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let value = match value {
            Value::Object(mut map) if !has_token_field(&map) && map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        let body = value.to_string();
        let raw: RawTokens = serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: format!("invalid token response: {e}"),
            body,
        })?;
        Ok(Self {
            access: SecretString::from(raw.access),
            refresh: raw.refresh.map(SecretString::from),
            user: raw.user,
        })
    }
}

fn has_token_field(map: &serde_json::Map<String, Value>) -> bool {
    ["access", "accessToken", "access_token", "token"]
        .iter()
        .any(|k| map.contains_key(*k))
}

/// Login result handed back to callers (tokens stay inside the session).
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: Option<Value>,
    pub has_refresh_token: bool,
}
