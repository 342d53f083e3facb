//! Shared configuration for fleetgate tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `fleetgate_core::GatewayConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use fleetgate_core::config::{DEFAULT_BASE_URL, DEFAULT_KEEP_UNUSED_FOR};
use fleetgate_core::{AuthSettings, Credentials, GatewayConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "fleetgate";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, falling back to the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Cache grace period in seconds.
    #[serde(default = "default_keep_unused_for")]
    pub keep_unused_for_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            keep_unused_for_secs: default_keep_unused_for(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_keep_unused_for() -> u64 {
    DEFAULT_KEEP_UNUSED_FOR.as_secs()
}

/// A named API profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// API root (e.g., "https://fleet.example.com/api/").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Username or email for the login endpoint.
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override cache grace period.
    pub keep_unused_for_secs: Option<u64>,

    pub login_path: Option<String>,
    pub refresh_path: Option<String>,
    pub logout_path: Option<String>,

    /// Header carrying the refresh token on the refresh call.
    pub refresh_header: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            password: None,
            password_env: None,
            timeout: None,
            keep_unused_for_secs: None,
            login_path: None,
            refresh_path: None,
            logout_path: None,
            refresh_header: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "fleetgate", "fleetgate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// `FLEETGATE_`-prefixed variables override file values; nested keys use
/// `__` (e.g. `FLEETGATE_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLEETGATE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?;
    entry.set_password(password)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve login credentials without CLI flags.
///
/// Returns `Ok(None)` when the profile has no username; a username without
/// any resolvable password is an error.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    resolve_credentials_with(profile, profile_name, |name| std::env::var(name).ok())
}

fn resolve_credentials_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(identifier) = profile
        .username
        .clone()
        .or_else(|| env("FLEETGATE_USERNAME"))
    else {
        return Ok(None);
    };

    let password = resolve_password_with(profile, profile_name, &env)?;
    Ok(Some(Credentials {
        identifier,
        password,
    }))
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Env var named by the profile, then the global one
    let env_name = profile.password_env.as_deref().unwrap_or("FLEETGATE_PASSWORD");
    if let Some(pw) = env(env_name) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `GatewayConfig` from a profile, with no CLI overrides.
pub fn profile_to_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewayConfig, ConfigError> {
    let credentials = resolve_credentials(profile, profile_name)?;
    gateway_config(profile, defaults, credentials)
}

/// Build a `GatewayConfig` from a profile with already-resolved credentials.
pub fn gateway_config(
    profile: &Profile,
    defaults: &Defaults,
    credentials: Option<Credentials>,
) -> Result<GatewayConfig, ConfigError> {
    let base_url = parse_base_url(&profile.base_url)?;
    Ok(build_gateway_config(profile, defaults, base_url, credentials))
}

/// Parse an API root, forcing a trailing slash so relative paths join
/// beneath it.
pub fn parse_base_url(raw: &str) -> Result<url::Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    normalized.parse().map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

fn build_gateway_config(
    profile: &Profile,
    defaults: &Defaults,
    base_url: url::Url,
    credentials: Option<Credentials>,
) -> GatewayConfig {
    let mut auth = AuthSettings::default();
    let overrides = [
        (&profile.login_path, &mut auth.login_path),
        (&profile.refresh_path, &mut auth.refresh_path),
        (&profile.logout_path, &mut auth.logout_path),
        (&profile.refresh_header, &mut auth.refresh_header),
    ];
    for (value, slot) in overrides {
        if let Some(value) = value {
            slot.clone_from(value);
        }
    }

    GatewayConfig {
        base_url,
        credentials,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        keep_unused_for: Duration::from_secs(
            profile
                .keep_unused_for_secs
                .unwrap_or(defaults.keep_unused_for_secs),
        ),
        auth,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.defaults.keep_unused_for_secs, 60);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profiles_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
default_profile = "staging"

[defaults]
timeout = 10

[profiles.staging]
base_url = "https://staging.fleet.test/api"
username = "ops@fleet.test"
refresh_header = "x-renew"
keep_unused_for_secs = 0
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "staging");
        assert_eq!(profile.username.as_deref(), Some("ops@fleet.test"));

        let gateway = gateway_config(profile, &cfg.defaults, None).unwrap();
        assert_eq!(gateway.base_url.as_str(), "https://staging.fleet.test/api/");
        assert_eq!(gateway.timeout, Duration::from_secs(10));
        assert_eq!(gateway.keep_unused_for, Duration::ZERO);
        assert_eq!(gateway.auth.refresh_header, "x-renew");
        assert_eq!(gateway.auth.login_path, "auth/login");
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        let err = cfg.profile(Some("prod")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { ref profile } if profile == "prod"));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                base_url: "http://localhost:5000/api/".into(),
                username: Some("ops".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, profile) = loaded.profile(None).unwrap();
        assert_eq!(profile.username.as_deref(), Some("ops"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = parse_base_url("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "base_url"));
    }

    #[test]
    fn default_profile_targets_local_api() {
        let gateway =
            profile_to_gateway_config(&Profile::default(), "default", &Defaults::default())
                .unwrap();
        assert_eq!(gateway.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(gateway.keep_unused_for, DEFAULT_KEEP_UNUSED_FOR);
    }

    #[test]
    fn profile_without_username_has_no_credentials() {
        let profile = Profile::default();
        let creds = resolve_credentials_with(&profile, "default", |_| None).unwrap();
        assert!(creds.is_none());
    }

    #[test]
    fn password_env_takes_precedence() {
        let profile = Profile {
            username: Some("ops".into()),
            password: Some("plaintext".into()),
            password_env: Some("FLEET_PW".into()),
            ..Profile::default()
        };
        let creds = resolve_credentials_with(&profile, "default", |name| {
            (name == "FLEET_PW").then(|| "from-env".to_owned())
        })
        .unwrap()
        .unwrap();
        assert_eq!(creds.identifier, "ops");
        assert_eq!(creds.password.expose_secret(), "from-env");
    }
}
