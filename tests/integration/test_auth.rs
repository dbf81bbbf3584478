//! Integration tests for account operations against a mock backend.
//!
//! The mock records the busy state it observes while handling each request,
//! so these tests check what the user saw during the call, not only after it.

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use lumina_auth::{
    AuthClient, AuthSession, NotificationLevel, UserRole, MSG_INVALID_CREDENTIALS, MSG_LOGIN_OK,
    MSG_LOGOUT_OK, MSG_REGISTER_OK, MSG_UPDATE_OK,
};
use lumina_core::{AuthConfig, BusyState, BusyStore, Config};
use serde_json::{json, Value};

const PASSWORD: &str = "correct horse";
const TOKEN: &str = "access-token-1";

/// What the mock backend saw.
#[derive(Clone)]
struct Backend {
    store: BusyStore,
    seen: Arc<Mutex<Vec<(String, BusyState)>>>,
}

impl Backend {
    fn record(&self, operation: &str) {
        self.seen
            .lock()
            .expect("lock poisoned")
            .push((operation.to_string(), self.store.snapshot()));
    }

    fn seen(&self) -> Vec<(String, BusyState)> {
        self.seen.lock().expect("lock poisoned").clone()
    }
}

fn user_json(name: &str, email: &str) -> Value {
    json!({
        "id": "u-42",
        "name": name,
        "email": email,
        "accountType": "student",
        "joinDate": "2024-02-01",
        "coursesEnrolled": 3
    })
}

fn is_authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {TOKEN}");
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str())
}

async fn login(State(backend): State<Backend>, Json(body): Json<Value>) -> impl IntoResponse {
    backend.record("login");
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad credentials" })));
    }
    let email = body["email"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "data": {
                "accessToken": TOKEN,
                "refreshToken": "refresh-token-1",
                "user": user_json("Ada", email)
            }
        })),
    )
}

async fn register(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.record("register");
    let name = body["userName"].as_str().unwrap_or_default();
    let email = body["email"].as_str().unwrap_or_default();
    Json(json!({ "data": user_json(name, email) }))
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> StatusCode {
    backend.record("logout");
    if is_authorized(&headers) {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn update(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.record("update");
    if !is_authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    let name = body["name"].as_str().unwrap_or_default();
    let email = body["email"].as_str().unwrap_or_default();
    (StatusCode::OK, Json(json!({ "data": user_json(name, email) })))
}

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Spawns the mock backend and returns a config pointing at it.
async fn spawn_backend(store: &BusyStore) -> (Config, Backend) {
    let backend = Backend {
        store: store.clone(),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let router = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/update", post(update))
        .with_state(backend.clone());

    let port = find_available_port();
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("Failed to bind");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock backend failed");
    });

    let config = Config {
        auth: AuthConfig {
            backend_url: format!("http://127.0.0.1:{port}/"),
            ..AuthConfig::default()
        },
        ..Config::default()
    };
    (config, backend)
}

fn session(config: &Config, store: &BusyStore) -> AuthSession {
    let client = AuthClient::new(&config.auth).expect("Failed to build client");
    AuthSession::new(client, store.clone(), config)
}

fn credentials_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("test_lumina_auth_{name}.json"));
    std::fs::remove_file(&path).ok();
    path
}

// ============================================================================
// Login
// ============================================================================

/// Tests that the overlay is up while the login request is in flight.
#[tokio::test]
async fn test_login_shows_overlay_during_request() {
    let store = BusyStore::new();
    let (config, backend) = spawn_backend(&store).await;
    let mut session = session(&config, &store);
    let mut notifications = session.subscribe();

    assert!(session.login("ada@example.com", PASSWORD).await);

    let seen = backend.seen();
    assert_eq!(seen.len(), 1);
    let (operation, during) = &seen[0];
    assert_eq!(operation, "login");
    assert!(during.active);
    assert_eq!(during.message, "Signing in...");
    assert!(during.progress.abs() < f64::EPSILON);

    // released afterwards
    let after = store.snapshot();
    assert!(!after.active);
    assert!(after.progress.abs() < f64::EPSILON);

    assert!(session.is_authenticated());
    let user = session.user().expect("user should be set");
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.account_type, UserRole::Student);

    let notification = notifications.recv().await.expect("notification");
    assert_eq!(notification.level, NotificationLevel::Success);
    assert_eq!(notification.message, MSG_LOGIN_OK);
}

/// Tests that a rejected login reports the generic message.
#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let store = BusyStore::new();
    let (config, backend) = spawn_backend(&store).await;
    let mut session = session(&config, &store);
    let mut notifications = session.subscribe();

    assert!(!session.login("ada@example.com", "wrong").await);

    assert_eq!(backend.seen().len(), 1);
    assert!(!store.is_active());
    assert!(!session.is_authenticated());
    assert!(session.user().is_none());

    let notification = notifications.recv().await.expect("notification");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.message, MSG_INVALID_CREDENTIALS);
}

/// Tests that credentials saved by one session are picked up by the next.
#[tokio::test]
async fn test_credentials_survive_between_sessions() {
    let store = BusyStore::new();
    let (config, _backend) = spawn_backend(&store).await;
    let path = credentials_path("persist");

    let mut first = session(&config, &store).with_persistence(&path);
    assert!(first.login("ada@example.com", PASSWORD).await);
    assert!(path.exists());
    drop(first);

    let mut second = session(&config, &store).with_persistence(&path);
    assert!(second.restore().expect("restore"));
    assert!(second.is_authenticated());
    assert_eq!(
        second.credentials().expect("credentials").access.value,
        TOKEN
    );

    // the restored token is accepted by the backend
    assert!(second.logout().await);
    assert!(!path.exists());
}

// ============================================================================
// Other Operations
// ============================================================================

/// Tests creating an account.
#[tokio::test]
async fn test_register_creates_account() {
    let store = BusyStore::new();
    let (config, backend) = spawn_backend(&store).await;
    let mut session = session(&config, &store);
    let mut notifications = session.subscribe();

    assert!(session.sign_up("Grace", "grace@example.com", PASSWORD).await);

    let (operation, during) = &backend.seen()[0];
    assert_eq!(operation, "register");
    assert!(during.active);
    assert_eq!(during.message, "Creating account...");

    assert_eq!(session.user().expect("user").name, "Grace");
    // registering does not sign in
    assert!(!session.is_authenticated());
    assert_eq!(
        notifications.recv().await.expect("notification").message,
        MSG_REGISTER_OK
    );
}

/// Tests changing the profile of a signed-in user.
#[tokio::test]
async fn test_update_profile_after_login() {
    let store = BusyStore::new();
    let (config, backend) = spawn_backend(&store).await;
    let mut session = session(&config, &store);

    assert!(session.login("ada@example.com", PASSWORD).await);
    let mut notifications = session.subscribe();
    assert!(
        session
            .change_information("Ada Lovelace", "ada@lovelace.dev")
            .await
    );

    let seen = backend.seen();
    let (operation, during) = &seen[1];
    assert_eq!(operation, "update");
    assert_eq!(during.message, "Saving changes...");

    let user = session.user().expect("user");
    assert_eq!(user.name, "Ada Lovelace");
    assert_eq!(user.email, "ada@lovelace.dev");
    assert_eq!(
        notifications.recv().await.expect("notification").message,
        MSG_UPDATE_OK
    );
    assert!(!store.is_active());
}

/// Tests that logging out forgets the user and the tokens.
#[tokio::test]
async fn test_logout_clears_session() {
    let store = BusyStore::new();
    let (config, backend) = spawn_backend(&store).await;
    let mut session = session(&config, &store);

    assert!(session.login("ada@example.com", PASSWORD).await);
    let mut notifications = session.subscribe();
    assert!(session.logout().await);

    let (operation, during) = &backend.seen()[1];
    assert_eq!(operation, "logout");
    assert_eq!(during.message, "Signing out...");

    assert!(session.user().is_none());
    assert!(session.credentials().is_none());
    assert!(!session.is_authenticated());
    assert_eq!(
        notifications.recv().await.expect("notification").message,
        MSG_LOGOUT_OK
    );

    // nothing left to sign out with
    assert!(!session.logout().await);
    assert_eq!(backend.seen().len(), 2);
}
