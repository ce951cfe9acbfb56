//! CLI configuration -- thin wrapper around `vexim_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--controller, --username, etc.).

use std::io::IsTerminal;
use std::time::Duration;

use secrecy::SecretString;

use vexim_core::{ControllerConfig, Readiness, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use vexim_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
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

/// Build a `ControllerConfig` from the config file, profile, and CLI
/// overrides. Without a profile, `--controller` and `--username` must be
/// given.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global);
    }

    let url_str = global
        .controller
        .as_deref()
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
    let username = global
        .username
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
        })?;
    let password = match std::env::var("VEXIM_PASSWORD") {
        Ok(pw) => SecretString::from(pw),
        Err(_) => prompt_login_password(&username, &profile_name)?,
    };

    Ok(ControllerConfig {
        url: parse_url(url_str)?,
        username,
        password,
        tenant: global.tenant.clone(),
        tls: TlsVerification::DangerAcceptInvalid,
        timeout: Duration::from_secs(global.timeout),
        readiness: Readiness::default(),
    })
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    // 1. Controller URL (flag > env > profile)
    let url = parse_url(global.controller.as_deref().unwrap_or(&profile.controller))?;

    // 2. Credentials (flag > profile > env; password per shared chain)
    let username = match global.username {
        Some(ref user) => user.clone(),
        None => vexim_config::resolve_username(profile, profile_name)?,
    };
    let password = vexim_config::resolve_password(profile, profile_name)?;

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        vexim_config::profile_tls(profile)
    };

    // 4. Tenant (flag > env > profile)
    let tenant = global.tenant.clone().or_else(|| profile.tenant.clone());

    Ok(ControllerConfig {
        url,
        username,
        password,
        tenant,
        tls,
        timeout: Duration::from_secs(global.timeout),
        readiness: vexim_config::profile_readiness(profile),
    })
}

fn parse_url(url_str: &str) -> Result<url::Url, CliError> {
    url_str.parse().map_err(|_| CliError::Validation {
        field: "controller".into(),
        reason: format!("invalid URL: {url_str}"),
    })
}

fn prompt_login_password(username: &str, profile_name: &str) -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    }
    let pw = rpassword::prompt_password(format!("Password for {username}: "))?;
    Ok(SecretString::from(pw))
}
