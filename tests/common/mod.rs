//! In-process mock of the scholarship API for integration tests.
//!
//! The server binds to 127.0.0.1:0, keeps its data in memory and records
//! what the client sent so tests can assert on it.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use scholarship_client::{ApiClient, ClientConfig};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub const SESSION_COOKIE: &str = "session=valid";
pub const WIDGET_HASH: &str = "good-hash";

#[derive(Default)]
pub struct MockData {
    pub applications: Vec<Value>,
    /// application id -> rating JSON
    pub ratings: BTreeMap<i64, Value>,
    pub ranking: Vec<i64>,
    pub my_application: Option<Value>,
    pub is_admin: bool,
    pub reject_ranking_saves: bool,
    pub ranking_saves: Vec<Vec<i64>>,
    pub rate_calls: Vec<(HashMap<String, String>, Value)>,
    pub submit_bodies: Vec<String>,
    pub export_disposition: Option<String>,
    pub promotions: Vec<(String, bool)>,
}

pub type Shared = Arc<Mutex<MockData>>;

pub struct MockServer {
    pub base_url: String,
    pub data: Shared,
    cancel: CancellationToken,
}

impl MockServer {
    pub async fn start(data: MockData) -> Self {
        let data: Shared = Arc::new(Mutex::new(data));
        let app = router(data.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .unwrap();
        });
        Self {
            base_url: format!("http://{}", addr),
            data,
            cancel,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.base_url)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config()).unwrap()
    }

    pub fn data(&self) -> std::sync::MutexGuard<'_, MockData> {
        self.data.lock().unwrap()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── fixtures ─────────────────────────────────────────────────────────────────

pub fn application_json(id: i64, full_name: &str) -> Value {
    json!({
        "id": id,
        "submitted_at": "2025-03-01T12:00:00Z",
        "session_id": format!("session-{}", id),
        "email": format!("student{}@innopolis.university", id),
        "full_name": full_name,
        "cv": format!("student{}/cv.pdf", id),
        "motivational_letter": format!("student{}/letter.pdf", id),
        "transcript": format!("student{}/grades.xlsx", id),
        "recommendation_letter": null,
        "almost_a_student": null
    })
}

pub fn rating_json(application_id: i64, rate: &str) -> Value {
    json!({
        "patron_id": 1,
        "application_id": application_id,
        "comment": "",
        "docs": {},
        "rate": rate
    })
}

/// Five applicants; 1-3 ranked and positive, 4 neutral, 5 unrated.
pub fn reviewer_data() -> MockData {
    let mut data = MockData {
        applications: (1..=5)
            .map(|id| application_json(id, &format!("Applicant {}", id)))
            .collect(),
        ranking: vec![1, 2, 3],
        ..Default::default()
    };
    for (id, rate) in [
        (1, "positive"),
        (2, "positive"),
        (3, "positive"),
        (4, "neutral"),
        (5, "unrated"),
    ] {
        data.ratings.insert(id, rating_json(id, rate));
    }
    data
}

// ── routes ───────────────────────────────────────────────────────────────────

fn router(data: Shared) -> Router {
    Router::new()
        .route("/patron/me", get(me))
        .route("/patron/applications", get(applications))
        .route("/patron/applications/{id}", get(application))
        .route("/patron/me/rated-applications", get(rated))
        .route("/patron/rate-application/{id}", post(rate))
        .route("/patron/ranking", get(get_ranking).put(put_ranking))
        .route("/admin/applications/export", get(export))
        .route("/admin/promote", put(promote))
        .route("/applicant/my-application", get(my_application))
        .route("/applicant/submit", post(submit))
        .route("/auth/telegram-callback", post(telegram_callback))
        .with_state(data)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookies| cookies.split(';').any(|c| c.trim() == SESSION_COOKIE))
}

fn find_application(data: &MockData, id: i64) -> Option<Value> {
    data.applications
        .iter()
        .find(|a| a["id"].as_i64() == Some(id))
        .cloned()
}

fn ranking_body(data: &MockData) -> Value {
    let applications: Vec<Value> = data
        .ranking
        .iter()
        .filter_map(|id| find_application(data, *id))
        .collect();
    json!({ "patron_id": 1, "applications": applications })
}

async fn me(State(data): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    let is_admin = data.lock().unwrap().is_admin;
    Json(json!({
        "telegram_id": "1001",
        "telegram_data": { "first_name": "Ada", "last_name": "Lovelace" },
        "is_admin": is_admin
    }))
    .into_response()
}

async fn applications(State(data): State<Shared>) -> Json<Vec<Value>> {
    Json(data.lock().unwrap().applications.clone())
}

async fn application(State(data): State<Shared>, Path(id): Path<i64>) -> Response {
    match find_application(&data.lock().unwrap(), id) {
        Some(app) => Json(app).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Application not found"),
    }
}

async fn rated(State(data): State<Shared>) -> Json<Vec<Value>> {
    Json(data.lock().unwrap().ratings.values().cloned().collect())
}

async fn rate(
    State(data): State<Shared>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    Json(docs): Json<Value>,
) -> Json<Value> {
    let mut data = data.lock().unwrap();
    let rating = json!({
        "patron_id": 1,
        "application_id": id,
        "comment": query.get("comment").cloned().unwrap_or_default(),
        "docs": docs.clone(),
        "rate": query.get("rate").cloned().unwrap_or_else(|| "unrated".to_string()),
    });
    data.rate_calls.push((query, docs));
    data.ratings.insert(id, rating.clone());
    Json(rating)
}

async fn get_ranking(State(data): State<Shared>) -> Json<Value> {
    Json(ranking_body(&data.lock().unwrap()))
}

async fn put_ranking(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut data = data.lock().unwrap();
    let ids: Vec<i64> = body["application_ids"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    data.ranking_saves.push(ids.clone());
    if data.reject_ranking_saves {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    if ids.iter().any(|id| find_application(&data, *id).is_none()) {
        return detail(StatusCode::BAD_REQUEST, "Application not found");
    }
    data.ranking = ids;
    Json(ranking_body(&data)).into_response()
}

async fn export(State(data): State<Shared>) -> Response {
    let disposition = data.lock().unwrap().export_disposition.clone();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            .parse()
            .unwrap(),
    );
    if let Some(disposition) = disposition {
        headers.insert(header::CONTENT_DISPOSITION, disposition.parse().unwrap());
    }
    (headers, vec![0x50u8, 0x4b, 0x03, 0x04]).into_response()
}

async fn promote(
    State(data): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let telegram_id = query.get("patron_telegram_id").cloned().unwrap_or_default();
    let is_admin = query.get("is_admin").map(String::as_str) == Some("true");
    data.lock()
        .unwrap()
        .promotions
        .push((telegram_id.clone(), is_admin));
    Json(json!({ "telegram_id": telegram_id, "telegram_data": {}, "is_admin": is_admin }))
}

async fn my_application(State(data): State<Shared>) -> Response {
    match data.lock().unwrap().my_application.clone() {
        Some(app) => Json(app).into_response(),
        None => detail(StatusCode::NOT_FOUND, "No application found"),
    }
}

async fn submit(State(data): State<Shared>, body: Bytes) -> Json<Value> {
    let mut data = data.lock().unwrap();
    data.submit_bodies
        .push(String::from_utf8_lossy(&body).into_owned());
    let app = application_json(77, "Grace Hopper");
    data.my_application = Some(app.clone());
    Json(app)
}

async fn telegram_callback(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("hash").map(String::as_str) != Some(WIDGET_HASH) {
        return detail(StatusCode::FORBIDDEN, "Invalid Telegram signature");
    }
    if query.get("invite_secret").map(String::as_str) != Some("invite") {
        return Json(Value::Null).into_response();
    }
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        format!("{}; Path=/; HttpOnly", SESSION_COOKIE).parse().unwrap(),
    );
    (
        headers,
        Json(json!({ "telegram_id": query.get("id"), "telegram_data": {}, "is_admin": false })),
    )
        .into_response()
}
