//! In-process stand-in for the survey backend, used by client tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use super::ApiClient;
use crate::auth::AuthStore;
use crate::config::{Config, Timeouts};
use crate::storage::MemoryStorage;

pub(crate) const PASSWORD: &str = "secret";
pub(crate) const REFRESH_TOKEN: &str = "refresh-1";

type Reply = (StatusCode, Json<Value>);

pub(crate) struct FakeBackend {
    valid_token: Mutex<String>,
    pub refresh_allowed: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub fail_respond: AtomicBool,
    hits: Mutex<Vec<String>>,
    shares: Mutex<Vec<Value>>,
    last_body: Mutex<Option<Value>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            valid_token: Mutex::new("access-1".into()),
            refresh_allowed: AtomicBool::new(true),
            refresh_calls: AtomicUsize::new(0),
            fail_respond: AtomicBool::new(false),
            hits: Mutex::new(Vec::new()),
            shares: Mutex::new(vec![share_json("sh1", "s1"), share_json("sh2", "s2")]),
            last_body: Mutex::new(None),
        }
    }

    /// Invalidate the current access token, as if it expired.
    pub fn expire_token(&self) {
        *self.valid_token.lock().unwrap_or_else(PoisonError::into_inner) = "access-2".into();
    }

    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner).iter().filter(|h| *h == route).count()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn share_ids(&self) -> Vec<String> {
        self.shares
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|s| s["id"].as_str().map(str::to_owned))
            .collect()
    }

    fn record(&self, route: &str, body: Option<&Value>) {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner).push(route.to_owned());
        if let Some(body) = body {
            *self.last_body.lock().unwrap_or_else(PoisonError::into_inner) = Some(body.clone());
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap_or_else(PoisonError::into_inner));
        headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }
}

pub(crate) fn user_json() -> Value {
    json!({ "id": "u1", "name": "Ada", "email": "ada@example.com", "isVerified": true })
}

pub(crate) fn survey_json(id: &str) -> Value {
    json!({
        "id": id,
        "title": "Customer feedback",
        "description": "Quarterly pulse",
        "questions": [
            { "id": "q1", "text": "Did you enjoy it?", "type": "yes-no",
              "conditionalBranching": { "Yes": ["q2"], "No": ["q3"] } },
            { "id": "q2", "text": "Favourite colour?", "type": "multiple-choice", "options": ["Red", "Green", "Blue"] },
            { "id": "q3", "text": "Rate us", "type": "rating" }
        ]
    })
}

pub(crate) fn responses_json(survey_id: &str) -> Value {
    json!([
        { "id": "r1", "surveyId": survey_id, "submittedAt": "2024-03-01T10:00:00Z",
          "answers": [{ "questionId": "q1", "value": true }, { "questionId": "q2", "value": "Red" }],
          "respondent": { "demographic": { "gender": "female", "city": "Lagos", "dateOfBirth": "1990-05-01" } } },
        { "id": "r2", "surveyId": survey_id, "submittedAt": "2024-03-02T10:00:00Z",
          "answers": [{ "questionId": "q1", "answer": false }, { "questionId": "q3", "value": 4 }] }
    ])
}

fn share_json(id: &str, survey_id: &str) -> Value {
    json!({
        "id": id,
        "surveyId": survey_id,
        "sharedBy": { "id": "u2", "name": "Grace", "email": "grace@example.com" },
        "status": "pending",
        "createdAt": "2024-03-01T09:00:00Z",
        "surveyTitle": format!("Survey {survey_id}")
    })
}

fn unauthorized() -> Reply {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid or expired token" })))
}

fn ok(value: Value) -> Reply {
    (StatusCode::OK, Json(value))
}

fn message(status: StatusCode, text: &str) -> Reply {
    (status, Json(json!({ "message": text })))
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn login(State(fake): State<Arc<FakeBackend>>, Json(body): Json<Value>) -> Reply {
    fake.record("POST /api/auth/login", Some(&body));
    if body["password"] != PASSWORD {
        return message(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let access = fake.valid_token.lock().unwrap_or_else(PoisonError::into_inner).clone();
    ok(json!({ "accessToken": access, "refreshToken": REFRESH_TOKEN, "user": user_json() }))
}

async fn refresh(State(fake): State<Arc<FakeBackend>>, Json(body): Json<Value>) -> Reply {
    fake.record("POST /api/auth/refresh-token", Some(&body));
    fake.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if !fake.refresh_allowed.load(Ordering::SeqCst) || body["refreshToken"] != REFRESH_TOKEN {
        return unauthorized();
    }
    let access = fake.valid_token.lock().unwrap_or_else(PoisonError::into_inner).clone();
    ok(json!({ "accessToken": access }))
}

async fn public_message(State(fake): State<Arc<FakeBackend>>, Json(body): Json<Value>) -> Reply {
    fake.record("POST public", Some(&body));
    if body.get("token").is_some_and(|t| t == "bad") {
        return message(StatusCode::BAD_REQUEST, "Invalid or expired token");
    }
    message(StatusCode::OK, "ok")
}

async fn change_password(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    fake.record("PUT /api/auth/password", Some(&body));
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    message(StatusCode::OK, "Password updated")
}

async fn profile(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap) -> Reply {
    fake.record("GET /api/auth/profile", None);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    ok(user_json())
}

async fn surveys(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap) -> Reply {
    fake.record("GET /api/surveys", None);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    ok(json!([survey_json("s1"), survey_json("s2")]))
}

async fn cities(State(fake): State<Arc<FakeBackend>>) -> Reply {
    fake.record("GET /api/surveys/cities", None);
    ok(json!(["Abuja", "Lagos"]))
}

async fn survey(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    fake.record("GET /api/surveys/{id}", None);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    if id == "missing" {
        return message(StatusCode::NOT_FOUND, "Survey not found");
    }
    ok(survey_json(&id))
}

async fn responses(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    fake.record("GET /api/surveys/{id}/responses", None);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    ok(responses_json(&id))
}

async fn pending(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap) -> Reply {
    fake.record("GET /api/survey-shares/pending", None);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    ok(Value::Array(fake.shares.lock().unwrap_or_else(PoisonError::into_inner).clone()))
}

async fn respond(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    fake.record("POST /api/survey-shares/respond", Some(&body));
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    if fake.fail_respond.load(Ordering::SeqCst) {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "");
    }
    let mut shares = fake.shares.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(index) = shares.iter().position(|s| s["id"] == body["shareId"]) else {
        return message(StatusCode::NOT_FOUND, "Share not found");
    };
    shares.remove(index);
    message(StatusCode::OK, "Share updated")
}

async fn share(State(fake): State<Arc<FakeBackend>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    fake.record("POST /api/survey-shares/share", Some(&body));
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    match body["email"].as_str().unwrap_or_default() {
        "missing@example.com" => message(StatusCode::NOT_FOUND, "User not found"),
        "pending@example.com" => message(StatusCode::BAD_REQUEST, "Survey share is already pending"),
        "accepted@example.com" => message(StatusCode::BAD_REQUEST, "Survey share was already accepted"),
        "owner@example.com" => message(StatusCode::BAD_REQUEST, "You are the owner of this survey"),
        _ => message(StatusCode::CREATED, "Survey shared"),
    }
}

// =============================================================================
// SPAWN
// =============================================================================

fn router(fake: Arc<FakeBackend>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(public_message))
        .route("/api/auth/verify-email", post(public_message))
        .route("/api/auth/forgot-password", post(public_message))
        .route("/api/auth/reset-password", post(public_message))
        .route("/api/auth/refresh-token", post(refresh))
        .route("/api/auth/password", put(change_password))
        .route("/api/auth/profile", get(profile))
        .route("/api/surveys", get(surveys))
        .route("/api/surveys/cities", get(cities))
        .route("/api/surveys/{id}", get(survey))
        .route("/api/surveys/{id}/responses", get(responses))
        .route("/api/survey-shares/pending", get(pending))
        .route("/api/survey-shares/respond", post(respond))
        .route("/api/survey-shares/share", post(share))
        .with_state(fake)
}

pub(crate) fn test_config(base_url: &str) -> Config {
    Config {
        base_url: base_url.to_owned(),
        token_file: PathBuf::new(),
        share_poll_interval: Duration::from_secs(60),
        timeouts: Timeouts { request_secs: 5, connect_secs: 5 },
    }
}

/// Serve a fresh backend on an ephemeral port and return a client for it with
/// empty token storage.
pub(crate) async fn spawn() -> (Arc<FakeBackend>, ApiClient) {
    let fake = Arc::new(FakeBackend::new());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(fake.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let auth = Arc::new(AuthStore::new(Arc::new(MemoryStorage::new())));
    let client = ApiClient::new(&test_config(&format!("http://{addr}")), auth).unwrap();
    (fake, client)
}

/// [`spawn`] with the client already holding valid tokens.
pub(crate) async fn spawn_signed_in() -> (Arc<FakeBackend>, ApiClient) {
    let (fake, client) = spawn().await;
    client.login("ada@example.com", PASSWORD).await.unwrap();
    (fake, client)
}
