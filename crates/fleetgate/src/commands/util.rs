//! Shared helpers for command handlers.

use std::io::IsTerminal;

use fleetgate_core::EntityId;
use serde_json::Value;

use crate::cli::BodyArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse the JSON body given inline or via `--from-file`.
pub fn read_body(args: &BodyArgs) -> Result<Value, CliError> {
    let raw = match (&args.data, &args.from_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "body".into(),
                reason: "pass --data or --from-file".into(),
            });
        }
    };
    let body: Value = serde_json::from_str(&raw)?;
    if !body.is_object() {
        return Err(CliError::Validation {
            field: "body".into(),
            reason: "expected a JSON object".into(),
        });
    }
    Ok(body)
}

pub fn ids(raw: &[String]) -> Vec<EntityId> {
    raw.iter().map(|id| EntityId::from(id.as_str())).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inline_body_must_be_an_object() {
        let args = BodyArgs {
            data: Some("[1, 2]".into()),
            from_file: None,
        };
        assert!(matches!(read_body(&args), Err(CliError::Validation { .. })));

        let args = BodyArgs {
            data: Some(r#"{"brand": "Kia"}"#.into()),
            from_file: None,
        };
        assert_eq!(read_body(&args).unwrap()["brand"], "Kia");
    }

    #[test]
    fn body_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car.json");
        std::fs::write(&path, r#"{"plate": "B-1"}"#).unwrap();
        let args = BodyArgs {
            data: None,
            from_file: Some(path),
        };
        assert_eq!(read_body(&args).unwrap()["plate"], "B-1");
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("Delete?", true).unwrap());
    }
}
