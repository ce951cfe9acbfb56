// ── Controller seam ──
//
// The engine only needs four verbs from the controller. Keeping them behind
// a trait lets the orchestrator and lifecycle operations run against an
// in-memory controller in tests.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use vexim_api::{DeleteOutcome, PostOutcome, VmanageClient};

/// Request/response access to the controller's `/dataservice/` surface.
///
/// Paths are relative to `/dataservice/`. Calls are issued one at a time;
/// implementations need not support concurrent use.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, vexim_api::Error>;

    async fn post(&self, path: &str, body: &Value) -> Result<PostOutcome, vexim_api::Error>;

    async fn put(&self, path: &str, body: &Value) -> Result<Value, vexim_api::Error>;

    async fn delete(&self, path: &str) -> Result<DeleteOutcome, vexim_api::Error>;
}

#[async_trait]
impl ControllerApi for VmanageClient {
    async fn get(&self, path: &str) -> Result<Value, vexim_api::Error> {
        VmanageClient::get(self, path).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<PostOutcome, vexim_api::Error> {
        VmanageClient::post(self, path, body).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, vexim_api::Error> {
        VmanageClient::put(self, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<DeleteOutcome, vexim_api::Error> {
        VmanageClient::delete(self, path).await
    }
}

/// `data[]` of a listing response, or nothing.
pub(crate) fn data_of(listing: &Value) -> &[Value] {
    listing
        .get("data")
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Fetch a listing, downgrading API errors to an empty listing.
///
/// Some inventory endpoints (newer list or definition subtypes) do not
/// exist on every controller release. Transport and session failures still
/// propagate.
pub(crate) async fn list_or_empty(
    api: &dyn ControllerApi,
    path: &str,
) -> Result<Value, vexim_api::Error> {
    match api.get(path).await {
        Ok(listing) => Ok(listing),
        Err(ref e) if e.is_not_found() => {
            debug!("{path}: not available (404), treating as empty");
            Ok(Value::Null)
        }
        Err(vexim_api::Error::Api { status, details }) => {
            warn!("{path}: controller error {status} ({details}), treating as empty");
            Ok(Value::Null)
        }
        Err(e) => Err(e),
    }
}
