//! Authorized transport layer for the fleet management API.
//!
//! - **[`Transport`]**: the executor contract: one [`ApiRequest`] in, one
//!   `Result<serde_json::Value, Error>` envelope out. [`HttpTransport`] is the
//!   reqwest-backed implementation.
//! - **[`AuthSession`]**: explicitly owned bearer/refresh token pair.
//! - **[`AuthInterceptor`]**: wraps any transport, attaches the bearer token,
//!   and recovers from token expiry with a single-flight refresh.

pub mod auth;
pub mod error;
pub mod interceptor;
pub mod session;
pub mod transport;

pub use auth::{AuthSettings, LoginRequest, LoginResponse, SESSION_EXPIRED_MESSAGE, TokenResponse};
pub use error::Error;
pub use interceptor::AuthInterceptor;
pub use session::AuthSession;
pub use transport::{ApiRequest, HttpTransport, Method, Transport, TransportConfig};
