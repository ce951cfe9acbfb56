//! Shared configuration for vexim.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to `vexim_core::ControllerConfig`. The CLI layers its flag
//! overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vexim_core::{ControllerConfig, DEFAULT_ARCHIVE, Readiness, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "vexim";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
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

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Archive path used when `export`/`import` get none.
    #[serde(default = "default_archive")]
    pub archive: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            archive: default_archive(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_archive() -> PathBuf {
    PathBuf::from(DEFAULT_ARCHIVE)
}

/// A named controller profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://vmanage.example.com:8443").
    pub controller: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or `VEXIM_PASSWORD`).
    pub password: Option<String>,

    /// Tenant name on multi-tenant controllers.
    pub tenant: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Seconds between readiness polls.
    pub poll_interval: Option<u64>,

    /// Upper bound in seconds on waiting for controller-side work.
    pub cooldown: Option<u64>,

    /// Seconds to wait after a controller push the controller gives no
    /// action id for.
    pub push_cooldown: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "vexim", "vexim").map_or_else(
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
    p.push("vexim");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment(file: impl figment::Provider) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(file)
        .merge(Env::prefixed("VEXIM_").split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    Ok(figment(Toml::file(config_path())).extract()?)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the profile's username: profile, then `VEXIM_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("VEXIM_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the password: `VEXIM_PASSWORD`, keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var("VEXIM_PASSWORD") {
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

/// Store a profile password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let keyring_err = |e: keyring::Error| ConfigError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    };
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .map_err(keyring_err)?
        .set_password(password)
        .map_err(keyring_err)
}

/// Parse and validate the profile's controller URL.
pub fn controller_url(profile: &Profile) -> Result<url::Url, ConfigError> {
    profile
        .controller
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "controller".into(),
            reason: format!("invalid URL: {}", profile.controller),
        })
}

/// TLS mode for a profile: explicit insecure wins, then a custom CA,
/// otherwise accept self-signed certificates.
pub fn profile_tls(profile: &Profile) -> TlsVerification {
    if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::DangerAcceptInvalid // vManage ships self-signed
    }
}

/// Readiness tuning, falling back to core defaults per field.
pub fn profile_readiness(profile: &Profile) -> Readiness {
    let defaults = Readiness::default();
    Readiness {
        poll_interval: profile
            .poll_interval
            .map_or(defaults.poll_interval, Duration::from_secs),
        timeout: profile.cooldown.map_or(defaults.timeout, Duration::from_secs),
        push_cooldown: profile
            .push_cooldown
            .map_or(defaults.push_cooldown, Duration::from_secs),
    }
}

/// Build a `ControllerConfig` from a profile, without CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ControllerConfig, ConfigError> {
    Ok(ControllerConfig {
        url: controller_url(profile)?,
        username: resolve_username(profile, profile_name)?,
        password: resolve_password(profile, profile_name)?,
        tenant: profile.tenant.clone(),
        tls: profile_tls(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(default_timeout())),
        readiness: profile_readiness(profile),
    })
}
