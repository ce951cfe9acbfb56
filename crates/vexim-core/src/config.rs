// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a vManage controller and how
// long to wait on its asynchronous actions. They carry credential data and
// tuning, but never touch disk. The CLI constructs a `ControllerConfig`
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs). Default, as most controllers
    /// ship with self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// How long to wait for controller-side work triggered by an action
/// (template detach, policy deactivation, push to controllers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Give up waiting after this long and carry on with a warning.
    pub timeout: Duration,
    /// Fixed wait after a controller push that returns no action id, when
    /// there is nothing to poll.
    pub push_cooldown: Duration,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(180),
            // Controllers take about two minutes to absorb a certificate
            // list push.
            push_cooldown: Duration::from_secs(120),
        }
    }
}

/// Configuration for connecting to a single controller.
///
/// Built by the CLI, passed to `Controller::connect` -- core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://vmanage.example.com:8443`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// Tenant to switch into on multi-tenant controllers.
    pub tenant: Option<String>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    pub readiness: Readiness,
}
