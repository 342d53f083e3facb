//! CLI configuration: thin wrapper around `fleetgate_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--base-url, --username, etc.).

use std::time::Duration;

use fleetgate_config::ConfigError;
use fleetgate_core::{Credentials, GatewayConfig};
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fleetgate_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `GatewayConfig` from the config file, profile, and CLI overrides.
/// Returns the active profile name alongside it.
///
/// Without a matching profile, `--base-url` alone is enough; credentials
/// then come from `--username` / `FLEETGATE_PASSWORD`.
pub fn build_gateway_config(global: &GlobalOpts) -> Result<(String, GatewayConfig), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.base_url.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available.join(", "),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let config = resolve_profile(&profile, &profile_name, &cfg.defaults, global)?;
    Ok((profile_name, config))
}

/// Translate a `Profile` + global flags into a `GatewayConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<GatewayConfig, CliError> {
    let profile = with_flag_overrides(profile, global);

    // A password flag (or FLEETGATE_PASSWORD) short-circuits the keyring.
    let credentials = match (&global.password, &profile.username) {
        (Some(password), Some(identifier)) => Some(Credentials {
            identifier: identifier.clone(),
            password: SecretString::from(password.clone()),
        }),
        _ => fleetgate_config::resolve_credentials(&profile, profile_name)
            .map_err(|e| map_config_error(e, profile_name))?,
    };

    let mut config = fleetgate_config::gateway_config(&profile, defaults, credentials)
        .map_err(|e| map_config_error(e, profile_name))?;
    if let Some(timeout) = global.timeout {
        config.timeout = Duration::from_secs(timeout);
    }
    Ok(config)
}

/// A copy of `profile` with `--base-url` / `--username` applied.
fn with_flag_overrides(profile: &Profile, global: &GlobalOpts) -> Profile {
    let mut profile = profile.clone();
    if let Some(ref url) = global.base_url {
        profile.base_url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    profile
}

fn map_config_error(err: ConfigError, profile_name: &str) -> CliError {
    match err {
        ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
        ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
            name: profile,
            available: String::new(),
        },
        ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
        other => {
            tracing::debug!(profile = profile_name, error = %other, "config error");
            CliError::Config(other)
        }
    }
}
