//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vexim_config::ConfigError;
use vexim_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(vexim::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS certificate verification failed: {reason}")]
    #[diagnostic(
        code(vexim::tls_error),
        help(
            "vManage usually ships a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or configure ca_cert in your profile."
        )
    )]
    TlsError { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vexim::auth_failed),
        help(
            "Verify the username and password for this controller.\n\
             Run: vexim config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(vexim::no_credentials),
        help(
            "Configure credentials with: vexim config init\n\
             Or set VEXIM_USERNAME and VEXIM_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("Tenant '{name}' not found")]
    #[diagnostic(
        code(vexim::tenant_not_found),
        help("Check the tenant name with your provider, or drop --tenant on single-tenant controllers.")
    )]
    TenantNotFound { name: String },

    // ── Import / export ──────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(vexim::unresolved_reference),
        help(
            "The referenced object was not created on the target controller.\n\
             Re-run with --skip-unresolved to record such objects as failed and continue."
        )
    )]
    UnresolvedReference { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(vexim::natural_key_collision),
        help("Rename one of the objects on the source controller and export again.")
    )]
    Collision { message: String },

    #[error("Invalid archive: {message}")]
    #[diagnostic(
        code(vexim::archive),
        help("Create an archive with: vexim export")
    )]
    InvalidArchive { message: String },

    #[error("{failed} object(s) failed to import")]
    #[diagnostic(
        code(vexim::import_failed),
        help("See the report above for the controller diagnostics.")
    )]
    ImportFailed { failed: usize },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(vexim::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vexim::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vexim::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vexim config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(vexim::no_config),
        help(
            "Create one with: vexim config init\n\
             Or pass --controller and --username.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(vexim::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(vexim::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Aborted")]
    #[diagnostic(code(vexim::aborted))]
    Aborted,

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(vexim::timeout),
        help("Increase timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::TenantNotFound { .. }
            | Self::UnresolvedReference { .. }
            | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Collision { .. } => exit_code::CONFLICT,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                if reason.starts_with("TLS error") {
                    CliError::TlsError { reason }
                } else {
                    CliError::ConnectionFailed {
                        url,
                        source: reason.into(),
                    }
                }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::TenantNotFound { name } => CliError::TenantNotFound { name },

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            err @ CoreError::UnresolvedReference { .. } => CliError::UnresolvedReference {
                message: err.to_string(),
            },

            err @ CoreError::NaturalKeyCollision { .. } => CliError::Collision {
                message: err.to_string(),
            },

            err @ (CoreError::MalformedObject { .. } | CoreError::Json(_)) => {
                CliError::InvalidArchive {
                    message: err.to_string(),
                }
            }

            CoreError::Archive { message } => CliError::InvalidArchive { message },

            CoreError::Io(e) => CliError::Io(e),

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
