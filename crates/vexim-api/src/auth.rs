// vManage authentication
//
// Form-based session login (`j_security_check`), XSRF token capture and
// tenant switching. The login endpoint sets a `JSESSIONID` cookie in the
// client's jar; subsequent requests use that cookie automatically.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{PostOutcome, RequestContext, VmanageClient};
use crate::error::Error;

impl VmanageClient {
    /// Authenticate with the controller using username/password.
    ///
    /// `POST /j_security_check` with `j_username`/`j_password` form fields.
    /// vManage answers 200 either way; a body containing `<html>` is the
    /// login page served back on rejected credentials.
    ///
    /// Controllers from 19.2 on also require an XSRF token for mutating
    /// requests, fetched from `GET /dataservice/client/token`. Older
    /// controllers answer 404 there, which is not an error.
    pub async fn login(&mut self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.root_url("j_security_check")?;
        debug!("logging in at {}", url);

        let resp = self
            .http()
            .post(url)
            .form(&[
                ("j_username", username),
                ("j_password", password.expose_secret()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() || body.contains("<html>") {
            return Err(Error::Authentication {
                message: format!("login rejected for user '{username}' (HTTP {status})"),
            });
        }

        let token_url = self.dataservice_url("client/token")?;
        let resp = self.http().get(token_url).send().await?;
        if resp.status().is_success() {
            let token = resp.text().await?;
            if !token.is_empty() && !token.contains("<html>") {
                self.set_xsrf_token(token);
            }
        } else {
            debug!(status = %resp.status(), "no XSRF token endpoint, continuing without");
        }

        debug!("login successful");
        Ok(())
    }

    /// End the current session. Best-effort: failures are only logged.
    pub async fn logout(&self) {
        let Ok(url) = self.root_url("logout") else {
            return;
        };
        debug!("logging out at {}", url);
        if let Err(e) = self.http().post(url).send().await {
            debug!(error = %e, "logout failed");
        }
    }

    /// Resolve a tenant by name and switch the session into it.
    ///
    /// `GET tenant` → match `data[].name` → `POST tenant/{tenantId}/switch`,
    /// whose response carries the `VSessionId` for the tenant context.
    pub async fn switch_tenant(&self, name: &str) -> Result<RequestContext, Error> {
        let tenants = self.get("tenant").await?;
        let tenant_id = tenants["data"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|t| t["name"].as_str() == Some(name))
            .and_then(|t| t["tenantId"].as_str())
            .ok_or_else(|| Error::TenantNotFound { name: name.into() })?
            .to_owned();

        debug!(tenant = name, %tenant_id, "switching tenant");
        let outcome = self
            .post(&format!("tenant/{tenant_id}/switch"), &json!({}))
            .await?;

        let session = match outcome {
            PostOutcome::Accepted(Value::Object(map)) => map
                .get("VSessionId")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        };

        session
            .map(|id| RequestContext {
                vsession_id: Some(id),
            })
            .ok_or_else(|| Error::Authentication {
                message: format!("tenant switch for '{name}' returned no VSessionId"),
            })
    }
}
