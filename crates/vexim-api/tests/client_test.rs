#![allow(clippy::unwrap_used)]
// Integration tests for `VmanageClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vexim_api::{
    ClientOptions, DeleteOutcome, Error, PostOutcome, RequestContext, VmanageClient,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, VmanageClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = VmanageClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn ds(suffix: &str) -> String {
    format!("/dataservice/{suffix}")
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_stores_xsrf_token() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .and(body_string_contains("j_username=admin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ds("client/token")))
        .respond_with(ResponseTemplate::new(200).set_body_string("tok-42"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ds("template/device")))
        .and(header("X-XSRF-TOKEN", "tok-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "test-password".to_string().into();
    client.login("admin", &secret).await.unwrap();

    let body = client.get("template/device").await.unwrap();
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_login_without_token_endpoint() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ds("client/token")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "test-password".to_string().into();
    client.login("admin", &secret).await.unwrap();
}

#[tokio::test]
async fn test_session_cookie_is_replayed_after_login() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let mut client = VmanageClient::new(base_url, &ClientOptions::default()).unwrap();

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "JSESSIONID=sess-7; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ds("client/token")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ds("template/feature")))
        .and(header("cookie", "JSESSIONID=sess-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "test-password".to_string().into();
    client.login("admin", &secret).await.unwrap();
    client.get("template/feature").await.unwrap();
}

#[tokio::test]
async fn test_login_failure_returns_login_page() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Login</body></html>"),
        )
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong-password".to_string().into();
    let result = client.login("admin", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Tenant tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_switch_tenant_sets_vsession_header() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(ds("tenant")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "name": "other", "tenantId": "t-1" },
                { "name": "acme", "tenantId": "t-2" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ds("tenant/t-2/switch")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "VSessionId": "vs-9" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ds("template/feature")))
        .and(header("VSessionId", "vs-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = client.switch_tenant("acme").await.unwrap();
    assert_eq!(
        ctx,
        RequestContext {
            vsession_id: Some("vs-9".into())
        }
    );

    let client = client.with_context(ctx);
    client.get("template/feature").await.unwrap();
}

#[tokio::test]
async fn test_switch_tenant_unknown_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(ds("tenant")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let result = client.switch_tenant("ghost").await;
    assert!(matches!(result, Err(Error::TenantNotFound { ref name }) if name == "ghost"));
}

// ── Mutation tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_post_accepted_returns_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(ds("template/policy/list/color")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listId": "new-1" })))
        .mount(&server)
        .await;

    let outcome = client
        .post("template/policy/list/color", &json!({ "name": "red" }))
        .await
        .unwrap();
    assert_eq!(outcome, PostOutcome::Accepted(json!({ "listId": "new-1" })));
}

#[tokio::test]
async fn test_post_duplicate_is_not_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(ds("template/feature/")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Bad Request",
                "details": "Template with name 'vpn0' already exists"
            }
        })))
        .mount(&server)
        .await;

    let outcome = client
        .post("template/feature/", &json!({ "templateName": "vpn0" }))
        .await
        .unwrap();
    assert!(matches!(outcome, PostOutcome::Duplicate(ref d) if d.starts_with("Template with name")));
}

#[tokio::test]
async fn test_post_other_400_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(ds("template/device/feature")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "details": "Invalid feature template id" }
        })))
        .mount(&server)
        .await;

    let result = client.post("template/device/feature", &json!({})).await;
    match result {
        Err(Error::Api { status, details }) => {
            assert_eq!(status, 400);
            assert_eq!(details, "Invalid feature template id");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_refused_factory_default() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(ds("template/feature/f-1")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "details": "Template is a factory default" }
        })))
        .mount(&server)
        .await;

    let outcome = client.delete("template/feature/f-1").await.unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Refused("Template is a factory default".into())
    );
}

#[tokio::test]
async fn test_get_login_page_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(ds("template/device")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = client.get("template/device").await;
    assert!(matches!(result, Err(Error::SessionExpired)));
}
