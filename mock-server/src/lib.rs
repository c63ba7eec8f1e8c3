//! In-memory stand-in for the Instafill API.
//!
//! Serves forms, sessions and profiles under the same paths as the real
//! service, rejects requests without the expected `x-api-key`, and records
//! every request it sees in a [`RequestLog`] so tests can inspect exactly what
//! a client sent.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Multipart, Path, Query, Request, State},
    http::{header, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex, sync::RwLock};
use uuid::Uuid;

pub use axum::http::StatusCode;

pub const API_KEY_HEADER: &str = "x-api-key";

const MAX_BODY: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Form {
    pub id: String,
    pub content_type: String,
    /// The submitted JSON document, or `{"size": n}` for binary uploads.
    pub definition: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub status: String,
    pub data: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredFile {
    pub id: u64,
    pub name: String,
    pub size: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub status: String,
    pub files: Vec<StoredFile>,
    pub text_info: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfilePage {
    pub items: Vec<Profile>,
    pub page: u32,
    pub size: u32,
    pub total: usize,
}

/// One request as it arrived at the mock.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<RecordedRequest>>>);

impl RequestLog {
    pub async fn snapshot(&self) -> Vec<RecordedRequest> {
        self.0.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.0.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.0.lock().await.is_empty()
    }

    pub async fn last(&self) -> Option<RecordedRequest> {
        self.0.lock().await.last().cloned()
    }

    async fn push(&self, req: RecordedRequest) {
        self.0.lock().await.push(req);
    }
}

#[derive(Default)]
struct Store {
    forms: HashMap<String, Form>,
    sessions: HashMap<String, Session>,
    profiles: HashMap<String, Profile>,
    profile_order: Vec<String>,
    next_file_id: u64,
}

/// Shared state behind the mock router.
#[derive(Clone)]
pub struct MockState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
    log: RequestLog,
    fail_next: Arc<Mutex<Option<StatusCode>>>,
}

impl MockState {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: Arc::from(api_key),
            store: Arc::default(),
            log: RequestLog::default(),
            fail_next: Arc::default(),
        }
    }

    pub fn log(&self) -> &RequestLog {
        &self.log
    }

    /// Answer the next request (after it is recorded) with `status`.
    pub async fn fail_next(&self, status: StatusCode) {
        *self.fail_next.lock().await = Some(status);
    }
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/v1/forms", get(list_forms).post(create_form))
        .route("/v1/forms/{id}", get(get_form).put(update_form))
        .route("/v1/session", post(create_session))
        .route("/v1/session/{id}", get(get_session))
        .route("/api/profile", get(list_profiles))
        .route("/api/profile/new", get(create_profile))
        .route("/api/profile/{id}", get(get_profile).delete(delete_profile))
        .route("/api/profile/{id}/name", put(update_profile_name))
        .route(
            "/api/profile/{id}/files",
            put(upload_files).delete(delete_files),
        )
        .route("/api/profile/{id}/text", put(update_profile_text))
        .layer(middleware::from_fn_with_state(state.clone(), gate))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Records the request, then applies failure injection and the API key check.
async fn gate(State(state): State<MockState>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, MAX_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => return error(StatusCode::PAYLOAD_TOO_LARGE, "body too large"),
    };
    state
        .log
        .push(RecordedRequest {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body: bytes.clone(),
        })
        .await;

    if let Some(status) = state.fail_next.lock().await.take() {
        tracing::debug!(%status, path = parts.uri.path(), "injected failure");
        return error(status, "injected failure");
    }

    let authorized = parts
        .headers
        .get(API_KEY_HEADER)
        .is_some_and(|v| v.as_bytes() == state.api_key.as_bytes());
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "invalid api key");
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// --- forms ---

async fn create_form(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let definition = match content_type.as_str() {
        "application/json" => match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(_) => return error(StatusCode::BAD_REQUEST, "malformed json"),
        },
        "application/octet-stream" => json!({ "size": body.len() }),
        _ => return error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported content type"),
    };
    let form = Form {
        id: Uuid::new_v4().to_string(),
        content_type,
        definition,
    };
    state.store.write().await.forms.insert(form.id.clone(), form.clone());
    (StatusCode::CREATED, Json(form)).into_response()
}

async fn list_forms(State(state): State<MockState>) -> Json<Vec<Form>> {
    let store = state.store.read().await;
    Json(store.forms.values().cloned().collect())
}

async fn get_form(State(state): State<MockState>, Path(id): Path<String>) -> Result<Json<Form>, Response> {
    let store = state.store.read().await;
    store
        .forms
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "form not found"))
}

async fn update_form(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(update): Json<Value>,
) -> Result<Json<Form>, Response> {
    let mut store = state.store.write().await;
    let form = store
        .forms
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "form not found"))?;
    match (&mut form.definition, update) {
        (Value::Object(existing), Value::Object(changes)) => existing.extend(changes),
        (definition, update) => *definition = update,
    }
    Ok(Json(form.clone()))
}

// --- sessions ---

async fn create_session(State(state): State<MockState>, Json(data): Json<Value>) -> (StatusCode, Json<Session>) {
    let session = Session {
        id: Uuid::new_v4().to_string(),
        status: "started".to_string(),
        data,
    };
    state
        .store
        .write()
        .await
        .sessions
        .insert(session.id.clone(), session.clone());
    (StatusCode::CREATED, Json(session))
}

async fn get_session(State(state): State<MockState>, Path(id): Path<String>) -> Result<Json<Session>, Response> {
    let store = state.store.read().await;
    store
        .sessions
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "session not found"))
}

// --- profiles ---

#[derive(Debug, Deserialize)]
struct ProfileFilter {
    #[serde(default)]
    name: String,
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default = "page_size")]
    size: u32,
    #[serde(default)]
    status: String,
}

fn first_page() -> u32 {
    1
}

fn page_size() -> u32 {
    10
}

async fn list_profiles(State(state): State<MockState>, Query(filter): Query<ProfileFilter>) -> Json<ProfilePage> {
    let store = state.store.read().await;
    let matching: Vec<&Profile> = store
        .profile_order
        .iter()
        .filter_map(|id| store.profiles.get(id))
        .filter(|p| filter.name.is_empty() || p.name.contains(&filter.name))
        .filter(|p| filter.status.is_empty() || p.status == filter.status)
        .collect();
    let skip = (filter.page.max(1) as usize - 1) * filter.size as usize;
    Json(ProfilePage {
        items: matching
            .iter()
            .skip(skip)
            .take(filter.size as usize)
            .map(|p| (*p).clone())
            .collect(),
        page: filter.page,
        size: filter.size,
        total: matching.len(),
    })
}

async fn create_profile(State(state): State<MockState>) -> Json<Profile> {
    let profile = Profile {
        id: Uuid::new_v4().to_string(),
        name: String::new(),
        status: "draft".to_string(),
        files: Vec::new(),
        text_info: Value::Null,
    };
    let mut store = state.store.write().await;
    store.profile_order.push(profile.id.clone());
    store.profiles.insert(profile.id.clone(), profile.clone());
    Json(profile)
}

async fn get_profile(State(state): State<MockState>, Path(id): Path<String>) -> Result<Json<Profile>, Response> {
    let store = state.store.read().await;
    store
        .profiles
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "profile not found"))
}

async fn delete_profile(State(state): State<MockState>, Path(id): Path<String>) -> Result<StatusCode, Response> {
    let mut store = state.store.write().await;
    store
        .profiles
        .remove(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "profile not found"))?;
    store.profile_order.retain(|p| p != &id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct NameUpdate {
    name: String,
}

async fn update_profile_name(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(update): Json<NameUpdate>,
) -> Result<Json<Profile>, Response> {
    let mut store = state.store.write().await;
    let profile = store
        .profiles
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "profile not found"))?;
    profile.name = update.name;
    Ok(Json(profile.clone()))
}

async fn upload_files(
    State(state): State<MockState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Profile>, Response> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error(StatusCode::BAD_REQUEST, &e.body_text()))?
    {
        if field.name() != Some("files") {
            return Err(error(StatusCode::BAD_REQUEST, "unexpected multipart field"));
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error(StatusCode::BAD_REQUEST, &e.body_text()))?;
        uploads.push((name, bytes.len()));
    }

    let mut store = state.store.write().await;
    let Store {
        profiles,
        next_file_id,
        ..
    } = &mut *store;
    let profile = profiles
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "profile not found"))?;
    for (name, size) in uploads {
        *next_file_id += 1;
        profile.files.push(StoredFile {
            id: *next_file_id,
            name,
            size,
        });
    }
    Ok(Json(profile.clone()))
}

#[derive(Debug, Deserialize)]
struct FileIds {
    ids: Vec<u64>,
}

async fn delete_files(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(FileIds { ids }): Json<FileIds>,
) -> Result<Json<Profile>, Response> {
    let mut store = state.store.write().await;
    let profile = store
        .profiles
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "profile not found"))?;
    profile.files.retain(|f| !ids.contains(&f.id));
    Ok(Json(profile.clone()))
}

#[derive(Debug, Deserialize)]
struct TextUpdate {
    text_info: Value,
}

async fn update_profile_text(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(update): Json<TextUpdate>,
) -> Result<Json<Profile>, Response> {
    let mut store = state.store.write().await;
    let profile = store
        .profiles
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "profile not found"))?;
    profile.text_info = update.text_info;
    Ok(Json(profile.clone()))
}
