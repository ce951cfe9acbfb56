// vManage REST client
//
// Wraps `reqwest::Client` with `/dataservice/` URL construction, tenant
// context headers, XSRF token handling and the controller's error
// diagnostics. Authentication and tenant switching live in `auth.rs` as
// inherent methods to keep this module focused on request mechanics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::cookie::Jar;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;

/// POST diagnostics that mean "this object already exists on the controller".
///
/// A 400 whose `error.details` starts with one of these is reported as
/// [`PostOutcome::Duplicate`] rather than an error, so re-importing an
/// archive into a partially populated controller keeps going.
pub const DUPLICATE_DIAGNOSTICS: &[&str] = &[
    "Template with name",
    "Duplicate policy list entry",
    "Duplicate policy detected with name",
    "vEdge policy with name",
    "vSmart policy with name",
    "Umbrella Token entry already exists",
    "Failed to create definition",
];

/// DELETE diagnostics for objects the controller refuses to remove.
pub const UNDELETABLE_DIAGNOSTICS: &[&str] = &[
    "Template is a factory default",
    "This policy list is a read only list and it cannot be deleted",
];

/// vManage wraps failures as `{"error": {"message": "...", "details": "..."}}`.
#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorInner>,
}

#[derive(serde::Deserialize)]
struct ErrorInner {
    message: Option<String>,
    details: Option<String>,
}

/// Result of a POST that the controller did not reject outright.
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// 2xx. Carries the response body, or `Value::Null` when it was not JSON.
    Accepted(Value),
    /// 400 with a known "already exists" diagnostic.
    Duplicate(String),
}

/// Result of a DELETE that the controller did not reject outright.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Value),
    /// 400 with a known "cannot be deleted" diagnostic (factory default
    /// template, read-only policy list).
    Refused(String),
}

/// Per-client request context.
///
/// Multi-tenant controllers scope every call to the tenant selected by
/// `tenant/{id}/switch`; the returned `VSessionId` must accompany each
/// subsequent request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub vsession_id: Option<String>,
}

/// How to verify the controller's certificate. Lab controllers commonly run
/// with a self-signed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    System,
    /// Trust the PEM bundle at this path in addition to the system store.
    CustomCa(PathBuf),
    DangerAcceptInvalid,
}

/// Connection settings for a [`VmanageClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub tls: TlsMode,
    /// Per-request timeout. Template pushes and large detail documents are
    /// slow on busy controllers, so this is generous by default.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(60),
        }
    }
}

/// The `reqwest::Client` behind one session. The `JSESSIONID` cookie set by
/// `j_security_check` lives in the jar, so every session gets its own.
fn session_http(options: &ClientOptions) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::Client::builder()
        .timeout(options.timeout)
        .cookie_provider(Arc::new(Jar::default()))
        .user_agent(concat!("vexim/", env!("CARGO_PKG_VERSION")));

    match options.tls {
        TlsMode::System => {}
        TlsMode::CustomCa(ref path) => {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("cannot read CA bundle {}: {e}", path.display())))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Tls(format!("invalid CA bundle {}: {e}", path.display())))?;
            builder = builder.add_root_certificate(cert);
        }
        TlsMode::DangerAcceptInvalid => builder = builder.danger_accept_invalid_certs(true),
    }

    builder
        .build()
        .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
}

/// Raw HTTP client for the vManage `/dataservice/` REST surface.
///
/// Session state is a cookie (set by `j_security_check`) plus an optional
/// XSRF token; both are established by [`login`](Self::login).
pub struct VmanageClient {
    http: reqwest::Client,
    base_url: Url,
    xsrf_token: Option<String>,
    context: RequestContext,
}

impl VmanageClient {
    /// Create an unauthenticated client with a fresh session cookie jar.
    /// `base_url` is the controller root, e.g.
    /// `https://vmanage.example.com:8443`.
    pub fn new(base_url: Url, options: &ClientOptions) -> Result<Self, Error> {
        Ok(Self::with_client(session_http(options)?, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`. Login only
    /// sticks if that client keeps cookies.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            xsrf_token: None,
            context: RequestContext::default(),
        }
    }

    /// Install a tenant context; every later request carries it.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn set_xsrf_token(&mut self, token: String) {
        debug!("storing XSRF token");
        self.xsrf_token = Some(token);
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a URL relative to the controller root, e.g. `j_security_check`.
    pub(crate) fn root_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    /// Build a REST URL: `{base}/dataservice/{path}`. `path` may carry a
    /// query string (`certificate/vedge/list?action=push`).
    pub fn dataservice_url(&self, path: &str) -> Result<Url, Error> {
        self.root_url(&format!("dataservice/{}", path.trim_start_matches('/')))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Attach the tenant and XSRF headers.
    fn prepare(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref session) = self.context.vsession_id {
            builder = builder.header("VSessionId", session);
        }
        if let Some(ref token) = self.xsrf_token {
            builder = builder.header("X-XSRF-TOKEN", token);
        }
        builder
    }

    /// `GET /dataservice/{path}` returning the raw body.
    pub async fn get_bytes(&self, path: &str) -> Result<Bytes, Error> {
        let url = self.dataservice_url(path)?;
        debug!("GET {url}");

        let resp = self.prepare(self.http.get(url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(api_error(status, resp).await);
        }
        Ok(resp.bytes().await?)
    }

    /// `GET /dataservice/{path}` parsed as JSON.
    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        let bytes = self.get_bytes(path).await?;
        parse_json(&bytes)
    }

    /// `POST /dataservice/{path}` with a JSON body.
    pub async fn post(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<PostOutcome, Error> {
        let url = self.dataservice_url(path)?;
        debug!("POST {url}");

        let resp = self.prepare(self.http.post(url).json(body)).send().await?;
        let status = resp.status();
        if status.is_success() {
            let text = resp.text().await?;
            return Ok(PostOutcome::Accepted(lenient_json(&text)));
        }

        let details = read_details(status, resp).await;
        if status == StatusCode::BAD_REQUEST && is_duplicate(&details) {
            trace!(%details, "duplicate entity");
            return Ok(PostOutcome::Duplicate(details));
        }
        Err(Error::Api {
            status: status.as_u16(),
            details,
        })
    }

    /// `PUT /dataservice/{path}` with a JSON body.
    pub async fn put(&self, path: &str, body: &(impl Serialize + Sync)) -> Result<Value, Error> {
        let url = self.dataservice_url(path)?;
        debug!("PUT {url}");

        let resp = self.prepare(self.http.put(url).json(body)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(api_error(status, resp).await);
        }
        let text = resp.text().await?;
        Ok(lenient_json(&text))
    }

    /// `DELETE /dataservice/{path}`.
    pub async fn delete(&self, path: &str) -> Result<DeleteOutcome, Error> {
        let url = self.dataservice_url(path)?;
        debug!("DELETE {url}");

        let resp = self.prepare(self.http.delete(url)).send().await?;
        let status = resp.status();
        if status.is_success() {
            let text = resp.text().await?;
            return Ok(DeleteOutcome::Deleted(lenient_json(&text)));
        }

        let details = read_details(status, resp).await;
        if status == StatusCode::BAD_REQUEST && UNDELETABLE_DIAGNOSTICS.contains(&details.as_str())
        {
            return Ok(DeleteOutcome::Refused(details));
        }
        Err(Error::Api {
            status: status.as_u16(),
            details,
        })
    }
}

// ── Response helpers ─────────────────────────────────────────────────

fn is_duplicate(details: &str) -> bool {
    DUPLICATE_DIAGNOSTICS
        .iter()
        .any(|prefix| details.starts_with(prefix))
}

/// Parse a 2xx body. vManage serves its HTML login page with HTTP 200
/// once the session cookie is gone, so that case maps to `SessionExpired`.
fn parse_json(bytes: &[u8]) -> Result<Value, Error> {
    serde_json::from_slice(bytes).map_err(|e| {
        let body = String::from_utf8_lossy(bytes).into_owned();
        if body.contains("<html>") {
            return Error::SessionExpired;
        }
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Some mutating endpoints answer with an empty or plain-text body.
fn lenient_json(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or(Value::Null)
}

/// Extract `error.details` (falling back to `error.message`, then the raw body).
async fn read_details(status: StatusCode, resp: reqwest::Response) -> String {
    let raw = resp.text().await.unwrap_or_default();
    if let Ok(ErrorEnvelope { error: Some(inner) }) = serde_json::from_str::<ErrorEnvelope>(&raw) {
        if let Some(details) = inner.details.or(inner.message) {
            return details;
        }
    }
    if raw.is_empty() {
        status.to_string()
    } else {
        raw.chars().take(200).collect()
    }
}

async fn api_error(status: StatusCode, resp: reqwest::Response) -> Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::SessionExpired;
    }
    Error::Api {
        status: status.as_u16(),
        details: read_details(status, resp).await,
    }
}
