//! Login handling.

use fleetgate_core::Gateway;
use serde_json::Value;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Log in with the configured credentials.
pub async fn authenticate(gateway: &Gateway, profile: &str) -> Result<(), CliError> {
    if gateway.config().credentials.is_none() {
        return Err(CliError::NoCredentials {
            profile: profile.into(),
        });
    }
    match gateway.login_with_config().await {
        Ok(response) => {
            debug!(
                user = ?response.user.as_ref().and_then(|u| u.get("_id")),
                refreshable = response.has_refresh_token,
                "authenticated"
            );
            Ok(())
        }
        Err(err) => match CliError::from(err) {
            CliError::AuthFailed { message, .. } => Err(CliError::AuthFailed {
                profile: profile.into(),
                message,
            }),
            other => Err(other),
        },
    }
}

/// Report the session established by [`authenticate`].
pub fn whoami(gateway: &Gateway, global: &GlobalOpts) {
    let identifier = gateway
        .config()
        .credentials
        .as_ref()
        .map(|c| c.identifier.clone())
        .unwrap_or_default();
    let summary = serde_json::json!({
        "identifier": identifier,
        "authenticated": gateway.is_authenticated(),
        "refreshable": gateway.session().has_refresh_token(),
    });
    let out = output::render_single(&global.output, &summary, |s| {
        s.get("identifier")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    });
    output::print_output(&out, global.quiet);
}
