// ── Core error types ──
//
// User-facing errors from vexim-core. Callers never see reqwest errors or
// raw JSON parse failures directly; the `From<vexim_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.
//
// Duplicate entities and unknown subtypes are outcomes recorded in the
// import report, not errors.

use thiserror::Error;

use crate::model::{Kind, Phase};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller connection timed out")]
    Timeout,

    #[error("Tenant not found: {name}")]
    TenantNotFound { name: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Remapping errors ─────────────────────────────────────────────
    /// A reference could not be carried across controllers: the old id is
    /// unknown to the archive, or its natural key was never created on the
    /// target.
    #[error(
        "Unresolved {target} reference '{native_id}'{}",
        natural_key.as_ref().map(|k| format!(" ({k} does not exist on the target controller)")).unwrap_or_default()
    )]
    UnresolvedReference {
        target: Phase,
        native_id: String,
        natural_key: Option<String>,
    },

    #[error("Two {kind} objects share natural key '{natural_key}': {first} and {second}")]
    NaturalKeyCollision {
        kind: Kind,
        natural_key: String,
        first: String,
        second: String,
    },

    #[error("Malformed {phase} object: {message}")]
    MalformedObject { phase: Phase, message: String },

    // ── Archive errors ───────────────────────────────────────────────
    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vexim_api::Error> for CoreError {
    fn from(err: vexim_api::Error) -> Self {
        match err {
            vexim_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vexim_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- re-authentication required".into(),
            },
            vexim_api::Error::TenantNotFound { name } => CoreError::TenantNotFound { name },
            vexim_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            vexim_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vexim_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vexim_api::Error::Api { status, details } => CoreError::Api {
                message: details,
                status: Some(status),
            },
            vexim_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_reference_names_missing_key() {
        let err = CoreError::UnresolvedReference {
            target: Phase::Lists,
            native_id: "old-1".into(),
            natural_key: Some("/color/red".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("old-1"));
        assert!(msg.contains("/color/red"));
    }

    #[test]
    fn api_error_keeps_status() {
        let err: CoreError = vexim_api::Error::Api {
            status: 400,
            details: "bad".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Api { status: Some(400), .. }));
    }
}
