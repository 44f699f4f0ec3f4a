//! End-to-end tests through the HTTP router with the in-memory backend.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use kasa_serena_backend::api::{router, AppState};
use kasa_serena_backend::config::Config;
use kasa_serena_backend::models::user::NewUser;
use kasa_serena_backend::storage::{MemStorage, Storage};
use kasa_serena_backend::utils::crypto::PasswordManager;

fn test_config() -> Config {
    Config {
        openai_api_key: "test-key".to_string(),
        gemini_api_key: "test-key".to_string(),
        session_secret: "test-secret".to_string(),
        database_path: None,
        port: 0,
    }
}

fn test_app() -> (Router, Arc<MemStorage>) {
    let storage = Arc::new(MemStorage::new());
    let state = AppState::new(storage.clone(), &test_config());
    (router(state), storage)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, value)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request_with_cookie(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// "kasa_session=<token>; HttpOnly; ..." → "kasa_session=<token>"
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

async fn register(app: &Router, username: &str) -> String {
    let (status, cookie, _) = send(
        app,
        json_request(
            "POST",
            "/api/register",
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "Str0ng.Pass"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    cookie_pair(&cookie.expect("register sets a session cookie"))
}

#[tokio::test]
async fn register_login_and_session_flow() {
    let (app, _) = test_app();

    let cookie = register(&app, "marta").await;

    let (status, _, user) = send(&app, get_with_cookie("/api/user", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["username"], "marta");
    assert!(user.get("passwordHash").is_none());

    // no session → 401
    let (status, _, _) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/user")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // logout revokes the session
    let (status, _, _) = send(
        &app,
        json_request_with_cookie("POST", "/api/logout", &cookie, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, get_with_cookie("/api/user", &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_returns_400_and_no_second_row() {
    let (app, storage) = test_app();
    register(&app, "unique").await;

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/register",
            json!({
                "username": "unique",
                "email": "different@example.com",
                "password": "Str0ng.Pass"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Username"));

    let user = storage.get_user_by_username("unique").await.unwrap().unwrap();
    assert_eq!(user.email, "unique@example.com");
}

#[tokio::test]
async fn project_crud_is_owner_scoped() {
    let (app, _) = test_app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, _, me) = send(&app, get_with_cookie("/api/user", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    let alice_id = me["id"].as_i64().unwrap();

    let (status, _, project) = send(
        &app,
        json_request_with_cookie(
            "POST",
            "/api/projects",
            &alice,
            json!({"name": "Puerta principal", "type": "puerta"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["userId"].as_i64().unwrap(), alice_id);
    let project_id = project["id"].as_i64().unwrap();
    let uri = format!("/api/projects/{}", project_id);

    // another user cannot mutate
    let (status, _, _) = send(
        &app,
        json_request_with_cookie("PUT", &uri, &bob, json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::COOKIE, &bob)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // the owner can
    let (status, _, updated) = send(
        &app,
        json_request_with_cookie("PUT", &uri, &alice, json!({"status": "in_progress"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");

    let (status, _, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::COOKIE, &alice)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&app, get_with_cookie(&uri, &alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_project_type_is_rejected() {
    let (app, _) = test_app();
    let cookie = register(&app, "typo").await;
    let (status, _, body) = send(
        &app,
        json_request_with_cookie(
            "POST",
            "/api/projects",
            &cookie,
            json!({"name": "X", "type": "submarino"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("submarino"));
}

#[tokio::test]
async fn login_rate_limit_returns_429_after_window_exhausted() {
    let (app, _) = test_app();
    // auth scope allows 10 requests/hour per IP
    for _ in 0..10 {
        let (status, _, _) = send(
            &app,
            json_request(
                "POST",
                "/api/login",
                json!({"usernameOrEmail": "ghost", "password": "nope"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/login",
            json!({"usernameOrEmail": "ghost", "password": "nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn catalog_is_public_and_filterable() {
    let (app, _) = test_app();

    let (status, _, materials) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/materials")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!materials.as_array().unwrap().is_empty());

    let (status, _, doors) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/materials/type/puerta")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    for material in doors.as_array().unwrap() {
        assert_eq!(material["type"], "puerta");
    }

    let (status, _, distributors) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/distributors")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!distributors.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn contact_form_validates_and_stores() {
    let (app, storage) = test_app();

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/contact",
            json!({"name": "Juan", "email": "not-an-email", "subject": "Hola", "message": "..."}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/contact",
            json!({
                "name": "Juan",
                "email": "juan@example.com",
                "subject": "Cotización",
                "message": "Quiero una puerta de roble",
                "subscribed": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let stored = storage.list_messages().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert!(!stored[0].is_read);
}

#[tokio::test]
async fn quote_flow_with_admin_review() {
    let (app, storage) = test_app();
    let customer = register(&app, "customer").await;

    let (status, _, quote) = send(
        &app,
        json_request_with_cookie(
            "POST",
            "/api/quotes",
            &customer,
            json!({"details": {"tipo": "cocina", "materiales": ["cuarzo"]}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(quote["status"], "pending");
    let quote_id = quote["id"].as_i64().unwrap();

    let (status, _, quotes) = send(&app, get_with_cookie("/api/quotes", &customer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quotes.as_array().unwrap().len(), 1);

    // a regular user cannot review quotes
    let status_uri = format!("/api/quotes/{}/status", quote_id);
    let (status, _, _) = send(
        &app,
        json_request_with_cookie("PUT", &status_uri, &customer, json!({"status": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // admins are provisioned directly in storage, not via the public API
    storage
        .create_user(NewUser {
            username: "backoffice".to_string(),
            email: "backoffice@example.com".to_string(),
            password_hash: PasswordManager::hash_password("Adm1n.Pass").unwrap(),
            full_name: None,
            role: "admin".to_string(),
            is_professional: false,
        })
        .await
        .unwrap();
    let (status, cookie, _) = send(
        &app,
        json_request(
            "POST",
            "/api/login",
            json!({"usernameOrEmail": "backoffice", "password": "Adm1n.Pass"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin = cookie_pair(&cookie.unwrap());

    let (status, _, reviewed) = send(
        &app,
        json_request_with_cookie(
            "PUT",
            &status_uri,
            &admin,
            json!({"status": "approved", "totalCost": 52000.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "approved");
    assert_eq!(reviewed["totalCost"].as_f64().unwrap(), 52000.0);
}

#[tokio::test]
async fn design_generator_returns_complete_shape_even_without_provider() {
    let (app, _) = test_app();
    let cookie = register(&app, "designer").await;

    // the test key cannot reach OpenAI; the gateway degrades to its canned
    // design instead of failing the request
    let (status, _, body) = send(
        &app,
        json_request_with_cookie(
            "POST",
            "/api/design-generator",
            &cookie,
            json!({
                "tipo": "puerta",
                "material": "roble",
                "color": "blanco",
                "estilo": "moderno",
                "medidas": "80x200"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["imageUrl"].as_str().unwrap().starts_with("http"));
    assert!(!body["description"].as_str().unwrap().is_empty());
    assert!(body["materials"].as_array().unwrap().len() >= 1);
    assert!(!body["estimatedTime"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn convert_heic_rejects_non_heic_uploads() {
    let (app, _) = test_app();
    let boundary = "XKASATESTBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"x.heic\"\r\nContent-Type: image/heic\r\n\r\nnot a heic file\r\n--{b}--\r\n",
        b = boundary
    );
    let (status, _, err) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/convert-heic")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("Image error"));
}
