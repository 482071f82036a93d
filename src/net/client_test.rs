use super::*;
use crate::auth::claims::unsigned_token;
use crate::net::mock::MockTransport;
use crate::router::navigation_channel;
use crate::storage::{AUTH_TOKEN_KEY, KeyValueStore, MemoryStore, TokenStore};
use serde_json::json;

struct Fixture {
    session: Arc<MemoryStore>,
    durable: Arc<MemoryStore>,
    auth: Arc<AuthState>,
}

fn fixture() -> Fixture {
    let session = Arc::new(MemoryStore::new());
    let durable = Arc::new(MemoryStore::new());
    let auth = AuthState::shared(TokenStore::new(session.clone(), durable.clone()));
    Fixture { session, durable, auth }
}

fn client(fx: &Fixture, transport: &Arc<MockTransport>) -> ApiClient {
    ApiClient::new("http://api.test/", transport.clone(), fx.auth.clone())
}

// =============================================================================
// request shaping
// =============================================================================

#[tokio::test]
async fn injects_bearer_token_when_present() {
    let fx = fixture();
    let token = unsigned_token(&json!({ "role": "member" }));
    fx.auth.login(&token).unwrap();
    let transport = Arc::new(MockTransport::new().respond_json(200, &json!({ "ok": true })));

    let _: serde_json::Value = client(&fx, &transport).get_json("/api/v1/persons/me").await.unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::Get);
    assert_eq!(sent.url, "http://api.test/api/v1/persons/me");
    assert_eq!(sent.header("authorization"), Some(format!("Bearer {token}").as_str()));
    assert_eq!(sent.header("Content-Type"), Some("application/json"));
}

#[tokio::test]
async fn session_scope_token_wins_for_header() {
    let fx = fixture();
    fx.session.set(AUTH_TOKEN_KEY, "session-token");
    fx.durable.set(AUTH_TOKEN_KEY, "durable-token");
    let transport = Arc::new(MockTransport::new().respond(200, "{}"));

    let _: serde_json::Value = client(&fx, &transport).get_json("x").await.unwrap();

    assert_eq!(transport.requests()[0].header("Authorization"), Some("Bearer session-token"));
    assert_eq!(transport.requests()[0].url, "http://api.test/x");
}

#[tokio::test]
async fn omits_authorization_without_token() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().respond(200, "[]"));

    let _: Vec<serde_json::Value> = client(&fx, &transport).get_json("/api/v1/services").await.unwrap();

    assert_eq!(transport.requests()[0].header("Authorization"), None);
}

#[tokio::test]
async fn put_sends_json_body() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().respond_json(200, &json!({ "id": 1 })));

    let reply: serde_json::Value = client(&fx, &transport)
        .put_json("/api/v1/persons/me", &json!({ "address": "Purok 3" }))
        .await
        .unwrap();

    assert_eq!(reply, json!({ "id": 1 }));
    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::Put);
    assert_eq!(sent.body, Some(json!({ "address": "Purok 3" })));
}

#[tokio::test]
async fn post_sends_json_body() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().respond_json(201, &json!({ "id": 42, "service_id": 1 })));

    let reply: serde_json::Value = client(&fx, &transport)
        .post_json("/api/v1/applications", &json!({ "service_id": 1 }))
        .await
        .unwrap();

    assert_eq!(reply["id"], json!(42));
    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.url, "http://api.test/api/v1/applications");
    assert_eq!(sent.body, Some(json!({ "service_id": 1 })));
    assert_eq!(sent.header("accept"), Some("application/json"));
}

#[tokio::test]
async fn delete_ignores_response_body() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().respond(204, ""));

    client(&fx, &transport).delete("/api/v1/appointments/7").await.unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.method, Method::Delete);
    assert_eq!(sent.body, None);
}

// =============================================================================
// 401
// =============================================================================

#[tokio::test]
async fn unauthorized_clears_session_and_signals_login() {
    let fx = fixture();
    fx.auth.login(&unsigned_token(&json!({ "role": "member" }))).unwrap();
    fx.session.set(AUTH_TOKEN_KEY, "session-copy");
    let (tx, mut rx) = navigation_channel();
    let transport = Arc::new(MockTransport::new().respond(401, r#"{"message":"jwt expired"}"#));

    let err = client(&fx, &transport)
        .with_signals(tx)
        .get_json::<serde_json::Value>("/api/v1/persons/me")
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!fx.auth.is_authenticated());
    assert_eq!(fx.session.get(AUTH_TOKEN_KEY), None);
    assert_eq!(fx.durable.get(AUTH_TOKEN_KEY), None);
    assert_eq!(
        rx.try_recv().unwrap(),
        NavigationSignal::SessionExpired { redirect: "/member/login".to_owned() }
    );
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().respond(401, "").respond(200, "{}"));

    let result = client(&fx, &transport).delete("/api/v1/sessions").await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn unauthorized_without_navigator_still_logs_out() {
    let fx = fixture();
    fx.auth.login(&unsigned_token(&json!({ "role": "admin" }))).unwrap();
    let transport = Arc::new(MockTransport::new().respond(401, ""));

    let _ = client(&fx, &transport).get_json::<serde_json::Value>("/x").await;

    assert!(!fx.auth.is_authenticated());
}

// =============================================================================
// other failures
// =============================================================================

#[tokio::test]
async fn other_statuses_pass_through_with_server_message() {
    let fx = fixture();
    fx.auth.login(&unsigned_token(&json!({ "role": "member" }))).unwrap();
    let transport = Arc::new(MockTransport::new().respond(422, r#"{"error":"contact_no is invalid"}"#));

    let err = client(&fx, &transport).get_json::<serde_json::Value>("/x").await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "contact_no is invalid");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(fx.auth.is_authenticated());
}

#[tokio::test]
async fn status_without_json_uses_reason_phrase() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().respond(503, "<html>down</html>"));

    let err = client(&fx, &transport).get_json::<serde_json::Value>("/x").await.unwrap_err();

    assert_eq!(err.to_string(), "Service Unavailable (status 503)");
}

#[tokio::test]
async fn forbidden_is_not_treated_as_unauthorized() {
    let fx = fixture();
    fx.auth.login(&unsigned_token(&json!({ "role": "member" }))).unwrap();
    let transport = Arc::new(MockTransport::new().respond(403, ""));

    let err = client(&fx, &transport).get_json::<serde_json::Value>("/x").await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 403, .. }));
    assert!(fx.auth.is_authenticated());
}

#[tokio::test]
async fn transport_failure_surfaces() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().fail("connection refused"));

    let err = client(&fx, &transport).get_json::<serde_json::Value>("/x").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new().respond(200, "not json"));

    let err = client(&fx, &transport).get_json::<serde_json::Value>("/x").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let fx = fixture();
    let transport = Arc::new(MockTransport::new());
    assert_eq!(client(&fx, &transport).base_url(), "http://api.test");
}
