// ── Controller session facade ──
//
// Owns the authenticated `VmanageClient` for one CLI invocation and vends
// the orchestrator and lifecycle views over it.

use tracing::{debug, info};
use vexim_api::{ClientOptions, TlsMode, VmanageClient};

use crate::api::ControllerApi;
use crate::config::{ControllerConfig, Readiness, TlsVerification};
use crate::error::CoreError;
use crate::lifecycle::Lifecycle;
use crate::orchestrator::Orchestrator;

/// An authenticated session against one vManage controller.
pub struct Controller {
    client: VmanageClient,
    readiness: Readiness,
}

impl Controller {
    /// Log in, fetch the XSRF token and, when configured, switch into the
    /// tenant. Fails fast on authentication or tenant errors.
    pub async fn connect(config: ControllerConfig) -> Result<Self, CoreError> {
        let options = ClientOptions {
            tls: tls_mode(&config.tls),
            timeout: config.timeout,
        };
        let mut client = VmanageClient::new(config.url.clone(), &options)?;

        debug!(url = %config.url, user = %config.username, "authenticating");
        client.login(&config.username, &config.password).await?;
        info!(url = %config.url, "connected to controller");

        if let Some(ref tenant) = config.tenant {
            let context = client.switch_tenant(tenant).await?;
            client = client.with_context(context);
            info!(tenant = %tenant, "switched tenant");
        }

        Ok(Self {
            client,
            readiness: config.readiness,
        })
    }

    pub fn api(&self) -> &dyn ControllerApi {
        &self.client
    }

    pub fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator::new(&self.client)
    }

    pub fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle::new(&self.client, self.readiness)
    }

    /// End the session. Best-effort.
    pub async fn disconnect(self) {
        self.client.logout().await;
        debug!("disconnected");
    }
}

fn tls_mode(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
