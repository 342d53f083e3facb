// ── Runtime gateway configuration ──
//
// Describes *where* the API lives and how the gateway behaves. Carries
// credential data but never touches disk: the CLI (or any other host)
// builds a `GatewayConfig` and hands it in.

use std::time::Duration;

use fleetgate_api::AuthSettings;
use secrecy::SecretString;
use url::Url;

/// Default API root when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";

/// How long an unused cache entry survives before eviction.
pub const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

/// Username (or email) and password for the login endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: SecretString,
}

/// Configuration for a single gateway instance.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API root, e.g. `https://fleet.example.com/api/`.
    pub base_url: Url,
    /// Credentials for [`Gateway::login_with_config`](crate::Gateway::login_with_config).
    pub credentials: Option<Credentials>,
    /// Per-request timeout, enforced by the transport.
    pub timeout: Duration,
    /// Grace period before an unsubscribed cache entry is evicted.
    /// `Duration::ZERO` evicts immediately.
    pub keep_unused_for: Duration,
    /// Reauthentication paths and headers.
    pub auth: AuthSettings,
}

impl GatewayConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            credentials: None,
            timeout: Duration::from_secs(30),
            keep_unused_for: DEFAULT_KEEP_UNUSED_FOR,
            auth: AuthSettings::default(),
        }
    }
}
