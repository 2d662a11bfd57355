use super::*;
use crate::web::{MemoryStore, MockTransport};
use std::rc::Rc;
use vpark_shared::{Role, UserProfile};

// =========================================================
// 辅助函数
// =========================================================

type TestClient = ApiClient<Rc<MockTransport>, MemoryStore>;

fn create_client() -> (Rc<MockTransport>, MemoryStore, TestClient) {
    let transport = MockTransport::new();
    let storage = MemoryStore::new();
    let client = ApiClient::new(
        ApiConfig::new("http://localhost:5000/api"),
        transport.clone(),
        SessionStore::new(storage.clone()),
    );
    (transport, storage, client)
}

fn login_body(role: &str) -> String {
    format!(
        r#"{{
            "success": true,
            "access_token": "jwt-123",
            "role": "{}",
            "user": {{
                "id": 1,
                "username": "meera",
                "email": "meera@example.com",
                "first_name": "Meera",
                "last_name": "S",
                "phone_number": "555",
                "address": null,
                "age": 40
            }}
        }}"#,
        role
    )
}

fn credentials() -> LoginRequest {
    LoginRequest {
        username: "meera".into(),
        password: "secret".into(),
    }
}

// =========================================================
// 凭据注入
// =========================================================

#[tokio::test]
async fn test_get_carries_bearer_token() {
    let (transport, _, client) = create_client();
    client.session().login("T1", Role::User, None).unwrap();

    client.get("/foo").await.unwrap();

    let req = transport.last_request();
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.url, "http://localhost:5000/api/foo");
    assert_eq!(req.header("Authorization"), Some("Bearer T1"));
    assert_eq!(req.body, None);
}

#[tokio::test]
async fn test_token_read_at_call_time() {
    let (transport, _, client) = create_client();
    client.session().login("T1", Role::User, None).unwrap();
    client.get("/a").await.unwrap();

    client.session().login("T2", Role::User, None).unwrap();
    client.get("/b").await.unwrap();

    let requests = transport.requests.borrow();
    assert_eq!(requests[0].header("Authorization"), Some("Bearer T1"));
    assert_eq!(requests[1].header("Authorization"), Some("Bearer T2"));
}

#[tokio::test]
async fn test_post_and_put_send_json() {
    let (transport, _, client) = create_client();
    client.session().login("T", Role::Admin, None).unwrap();

    client
        .post("/admin/lots", &serde_json::json!({ "price": 40 }))
        .await
        .unwrap();
    client
        .put("/admin/lots/2", &serde_json::json!({ "price": 50 }))
        .await
        .unwrap();

    let requests = transport.requests.borrow();
    for (req, method) in requests.iter().zip([HttpMethod::Post, HttpMethod::Put]) {
        assert_eq!(req.method, method);
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("Authorization"), Some("Bearer T"));
    }
    assert_eq!(requests[0].body.as_deref(), Some(r#"{"price":40}"#));
}

#[tokio::test]
async fn test_delete_has_no_body() {
    let (transport, _, client) = create_client();
    client.session().login("T", Role::Admin, None).unwrap();

    client.delete("/admin/lots/2").await.unwrap();

    let req = transport.last_request();
    assert_eq!(req.method, HttpMethod::Delete);
    assert_eq!(req.body, None);
    assert_eq!(req.header("Content-Type"), None);
    assert_eq!(req.header("Authorization"), Some("Bearer T"));
}

#[tokio::test]
async fn test_caller_headers_kept_but_authorization_overwritten() {
    let (transport, _, client) = create_client();
    client.session().login("real", Role::User, None).unwrap();

    let options = RequestOptions::default()
        .header("X-Trace", "42")
        .header("authorization", "Bearer forged");
    client.get_with("/user/history", options).await.unwrap();

    let req = transport.last_request();
    assert_eq!(req.header("X-Trace"), Some("42"));
    let auth: Vec<_> = req
        .headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        .collect();
    assert_eq!(auth.len(), 1);
    assert_eq!(auth[0].1, "Bearer real");
}

#[tokio::test]
async fn test_missing_credential_still_sends() {
    let (transport, _, client) = create_client();

    let options = RequestOptions::default().header("Authorization", "Bearer stale");
    client.get_with("/user/lots", options).await.unwrap();

    let req = transport.last_request();
    assert_eq!(req.header("Authorization"), None);
    assert_eq!(transport.requests.borrow().len(), 1);
}

// =========================================================
// 失败策略
// =========================================================

#[tokio::test]
async fn test_error_status_passes_through() {
    let (transport, _, client) = create_client();
    client.session().login("T", Role::User, None).unwrap();
    transport.respond_with(HttpResponse::new(403, r#"{"msg":"forbidden"}"#));

    let response = client.get("/admin/users").await.unwrap();

    assert_eq!(response.status(), 403);
    assert!(!response.ok());
    assert_eq!(response.text(), r#"{"msg":"forbidden"}"#);
    assert_eq!(transport.requests.borrow().len(), 1);
}

#[tokio::test]
async fn test_transport_error_not_retried() {
    let (transport, _, client) = create_client();
    transport.fail_with(HttpError::NetworkError("offline".into()));

    let err = client.get("/user/lots").await.unwrap_err();

    assert!(matches!(err, HttpError::NetworkError(_)));
    assert_eq!(transport.requests.borrow().len(), 1);
}

// =========================================================
// login
// =========================================================

#[tokio::test]
async fn test_login_stores_session_and_returns_raw_response() {
    let (transport, storage, client) = create_client();
    transport.respond_with(HttpResponse::new(200, login_body("admin")));

    let response = client.login(&credentials()).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), login_body("admin"));
    assert_eq!(storage.get("token").as_deref(), Some("jwt-123"));
    assert_eq!(client.session().role(), Some(Role::Admin));
    let profile: UserProfile = client.session().profile().unwrap();
    assert_eq!(profile.username, "meera");
    assert_eq!(profile.age, Some(40));

    let req = transport.last_request();
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, "http://localhost:5000/api/auth/login");
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(
        req.body.as_deref(),
        Some(r#"{"username":"meera","password":"secret"}"#)
    );
}

#[tokio::test]
async fn test_login_ignores_existing_token() {
    let (transport, _, client) = create_client();
    client.session().login("old", Role::User, None).unwrap();
    transport.respond_with(HttpResponse::new(200, login_body("user")));

    client.login(&credentials()).await.unwrap();

    let req = transport.last_request();
    assert_eq!(req.header("Authorization"), None);
    assert_eq!(client.session().token().as_deref(), Some("jwt-123"));
}

#[tokio::test]
async fn test_rejected_login_leaves_session_untouched() {
    let (transport, _, client) = create_client();
    transport.respond_with(HttpResponse::new(
        401,
        r#"{"success":false,"message":"Invalid credentials"}"#,
    ));

    let response = client.login(&credentials()).await.unwrap();

    assert_eq!(response.status(), 401);
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_login_with_malformed_payload_fails() {
    let (transport, _, client) = create_client();
    transport.respond_with(HttpResponse::new(200, r#"{"success":true}"#));

    let err = client.login(&credentials()).await.unwrap_err();

    assert!(matches!(err, HttpError::InvalidLoginResponse(_)));
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_logout_then_requests_lose_credential() {
    let (transport, _, client) = create_client();
    transport.respond_with(HttpResponse::new(200, login_body("user")));
    client.login(&credentials()).await.unwrap();

    client.logout().unwrap();
    client.get("/user/lots").await.unwrap();

    assert_eq!(transport.last_request().header("Authorization"), None);
}

// =========================================================
// 类型化接口
// =========================================================

#[tokio::test]
async fn test_check_username() {
    let (transport, _, client) = create_client();
    transport.respond_with(HttpResponse::new(200, r#"{"success":true,"available":false}"#));

    let available = client.check_username("meera").await.unwrap();

    assert!(!available);
    let req = transport.last_request();
    assert_eq!(req.url, "http://localhost:5000/api/auth/check-username");
    assert_eq!(req.body.as_deref(), Some(r#"{"username":"meera"}"#));
}

#[tokio::test]
async fn test_register_conflict_maps_to_status_error() {
    let (transport, _, client) = create_client();
    transport.respond_with(HttpResponse::new(
        409,
        r#"{"success":false,"message":"Username already exists"}"#,
    ));
    let request = RegisterRequest {
        username: "meera".into(),
        email: "meera@example.com".into(),
        password: "pw".into(),
        first_name: "Meera".into(),
        last_name: "S".into(),
        phone_number: "555".into(),
        age: None,
        address: String::new(),
    };

    let err = client.register(&request).await.unwrap_err();

    assert!(matches!(err, HttpError::Status { status: 409, .. }));
}
