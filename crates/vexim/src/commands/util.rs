//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::config;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt twice for a new password; the entries must match and be non-empty.
pub fn prompt_new_password(label: &str) -> Result<SecretString, CliError> {
    let first = rpassword::prompt_password(format!("{label}: "))?;
    let second = rpassword::prompt_password(format!("Confirm {}: ", label.to_lowercase()))?;
    if first != second {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "passwords do not match".into(),
        });
    }
    if first.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(first))
}

/// Archive path: the argument, else the configured default.
pub fn archive_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| config::load_config_or_default().defaults.archive)
}
