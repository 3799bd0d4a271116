//! Shared fixtures for handler and manager tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use lib_core::model::store::models::User;
use lib_core::{ModelManager, Settings};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::UserEvents;
use crate::server::{create_router, AppState};

pub const TEST_SECRET: &str = "test-secret-key-must-be-at-least-32-characters-long!";
pub const PASSWORD: &str = "correct horse battery";

// region: --- Database

pub fn sqlite_settings(dir: &TempDir) -> Settings {
    let path = dir.path().join("test.sqlite3");
    let vars: HashMap<&'static str, String> = [
        ("DB_TYPE", "sqlite".to_string()),
        ("SQLITE_PATH", path.to_string_lossy().into_owned()),
        ("JWT_SECRET", TEST_SECRET.to_string()),
    ]
    .into_iter()
    .collect();

    Settings::from_source(|key| vars.get(key).cloned()).unwrap()
}

/// Postgres settings pointing at a port nothing listens on.
pub fn unreachable_postgres_settings() -> Settings {
    let vars: HashMap<&'static str, String> = [
        ("DB_TYPE", "postgres".to_string()),
        ("DB_HOST", "127.0.0.1".to_string()),
        ("DB_PORT", "1".to_string()),
        ("POOL_TIMEOUT", "1".to_string()),
        ("JWT_SECRET", TEST_SECRET.to_string()),
    ]
    .into_iter()
    .collect();

    Settings::from_source(|key| vars.get(key).cloned()).unwrap()
}

/// A set-up manager over a fresh on-disk database with the schema created.
pub async fn sqlite_mm() -> (TempDir, ModelManager) {
    let dir = tempfile::tempdir().unwrap();
    let mm = ModelManager::new();
    mm.setup(&sqlite_settings(&dir)).await.unwrap();
    mm.create_schema().await.unwrap();
    (dir, mm)
}

// endregion: --- Database

// region: --- Events

/// Records every hook call so tests can pick up issued tokens.
#[derive(Default)]
pub struct RecordingEvents {
    registered: Mutex<Vec<Uuid>>,
    reset_tokens: Mutex<Vec<String>>,
    verify_tokens: Mutex<Vec<String>>,
    logins: Mutex<Vec<Uuid>>,
    updated: Mutex<Vec<Vec<&'static str>>>,
    deleted: Mutex<Vec<Uuid>>,
}

impl RecordingEvents {
    pub fn registered(&self) -> Vec<Uuid> {
        self.registered.lock().unwrap().clone()
    }

    pub fn last_reset_token(&self) -> Option<String> {
        self.reset_tokens.lock().unwrap().last().cloned()
    }

    pub fn last_verify_token(&self) -> Option<String> {
        self.verify_tokens.lock().unwrap().last().cloned()
    }

    pub fn logins(&self) -> Vec<Uuid> {
        self.logins.lock().unwrap().clone()
    }

    pub fn updated_fields(&self) -> Vec<Vec<&'static str>> {
        self.updated.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserEvents for RecordingEvents {
    async fn on_after_register(&self, user: &User) {
        self.registered.lock().unwrap().push(user.id);
    }

    async fn on_after_forgot_password(&self, _user: &User, token: &str) {
        self.reset_tokens.lock().unwrap().push(token.to_string());
    }

    async fn on_after_request_verify(&self, _user: &User, token: &str) {
        self.verify_tokens.lock().unwrap().push(token.to_string());
    }

    async fn on_after_login(&self, user: &User) {
        self.logins.lock().unwrap().push(user.id);
    }

    async fn on_after_update(&self, _user: &User, fields: &[&'static str]) {
        self.updated.lock().unwrap().push(fields.to_vec());
    }

    async fn on_after_delete(&self, user: &User) {
        self.deleted.lock().unwrap().push(user.id);
    }
}

// endregion: --- Events

// region: --- App

pub async fn sqlite_app_state() -> (TempDir, AppState, Arc<RecordingEvents>) {
    let dir = tempfile::tempdir().unwrap();
    let settings = sqlite_settings(&dir);

    let mm = ModelManager::new();
    mm.setup(&settings).await.unwrap();
    mm.create_schema().await.unwrap();

    let events = Arc::new(RecordingEvents::default());
    let state = AppState::new(mm, Arc::new(settings), events.clone());
    (dir, state, events)
}

/// Full router (middleware included) over a fresh database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub events: Arc<RecordingEvents>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let (dir, state, events) = sqlite_app_state().await;
        let router = create_router(state.clone(), &[]);
        Self {
            router,
            state,
            events,
            _dir: dir,
        }
    }

    /// Router over a set-up but never connected engine for `settings`.
    pub async fn with_settings(settings: Settings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mm = ModelManager::new();
        mm.setup(&settings).await.unwrap();

        let events = Arc::new(RecordingEvents::default());
        let state = AppState::new(mm, Arc::new(settings), events.clone());
        let router = create_router(state.clone(), &[]);
        Self {
            router,
            state,
            events,
            _dir: dir,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    /// Register through the manager, bypassing HTTP. `flags` are applied unsafely.
    pub async fn create_user(&self, email: &str, superuser: bool, verified: bool) -> User {
        let mut create = lib_core::dto::UserCreate::new(email, PASSWORD);
        create.is_superuser = Some(superuser);
        create.is_verified = Some(verified);
        self.state.users.register(create, false).await.unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(form_request("/auth/jwt/login", &[("username", email), ("password", password)]))
            .await
    }

    /// Log in and return the bearer token.
    pub async fn token_for(&self, email: &str) -> String {
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }
}

pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            b' ' => "+".to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

// endregion: --- App
