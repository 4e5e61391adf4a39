//! Throwaway backend for integration tests.
//!
//! Serves the `/api` routes and the `/api/chat` socket on an ephemeral port and
//! records what it received. The only accepted bearer token is `GOOD_TOKEN`.
//! The chat socket also accepts a missing token; it answers `EXPIRED_TOKEN`
//! with a 401 and closes `REVOKED_TOKEN` sockets with code 1008.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket},
        Multipart, Path, Query, State, WebSocketUpgrade,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

pub const GOOD_TOKEN: &str = "good-token";
pub const GOOD_PASSWORD: &str = "correct horse";
pub const TAKEN_EMAIL: &str = "taken@example.com";
pub const EXPIRED_TOKEN: &str = "expired";
pub const REVOKED_TOKEN: &str = "revoked";

#[derive(Debug, Default)]
pub struct Recorded {
    /// Stored documents as (filename, bytes).
    pub documents: Vec<(String, Vec<u8>)>,
    pub signups: Vec<Value>,
    /// `Authorization` header of each chat handshake.
    pub chat_auth: Vec<Option<String>>,
    pub chat_sessions: Vec<String>,
    /// Text frames received on any chat socket.
    pub frames: Vec<String>,
    /// When set, `/api/metrics` answers `{"error": ...}`.
    pub metrics_error: Option<String>,
}

type Shared = Arc<Mutex<Recorded>>;

pub struct FakeBackend {
    pub addr: SocketAddr,
    pub recorded: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let recorded = Shared::default();
        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/signup", post(signup))
            .route("/api/upload", post(upload))
            .route("/api/documents", get(list_documents))
            .route("/api/documents/{filename}", delete(delete_document))
            .route("/api/metrics", get(metrics))
            .route("/api/metrics/sessions/{session_id}", get(session_metrics))
            .route("/api/chat", get(chat))
            .with_state(Arc::clone(&recorded));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, recorded }
    }

    pub fn http_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub fn ws_url(&self) -> Url {
        Url::parse(&format!("ws://{}", self.addr)).unwrap()
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {GOOD_TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Invalid or expired token"})),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == GOOD_PASSWORD {
        Json(json!({
            "access_token": GOOD_TOKEN,
            "token_type": "bearer",
            "user_id": "user-1",
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect email or password"})),
        )
            .into_response()
    }
}

async fn signup(State(recorded): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["email"] == TAKEN_EMAIL {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Email already registered"})),
        )
            .into_response();
    }
    recorded.lock().unwrap().signups.push(body);
    Json(json!({"message": "User created successfully"})).into_response()
}

async fn upload(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let bytes = field.bytes().await.unwrap().to_vec();
        recorded.lock().unwrap().documents.push((filename.clone(), bytes));
        return Json(json!({
            "public_url": format!("https://files.example.com/{filename}"),
            "message": "File uploaded successfully",
        }))
        .into_response();
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"detail": [{"msg": "field required"}]})),
    )
        .into_response()
}

async fn list_documents(State(recorded): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let recorded = recorded.lock().unwrap();
    let documents: Vec<Value> = recorded
        .documents
        .iter()
        .map(|(name, bytes)| {
            json!({
                "filename": name,
                "uploaded_by": "user-1",
                "upload_date": "2024-05-01T10:00:00Z",
                "url": format!("https://files.example.com/{name}"),
                "size": bytes.len(),
            })
        })
        .collect();
    Json(json!({"total": documents.len(), "documents": documents})).into_response()
}

async fn delete_document(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut recorded = recorded.lock().unwrap();
    let before = recorded.documents.len();
    recorded.documents.retain(|(name, _)| *name != filename);
    if recorded.documents.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Document not found"})),
        )
            .into_response();
    }
    Json(json!({"message": "Document deleted"})).into_response()
}

async fn metrics(State(recorded): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if let Some(error) = recorded.lock().unwrap().metrics_error.clone() {
        return Json(json!({"error": error})).into_response();
    }
    Json(json!({
        "total_requests": "12",
        "successful_requests": 11,
        "success_rate": 0.9166,
        "avg_latency": 1.5,
        "p50_latency": 1.2,
        "p95_latency": 2.8,
        "p99_latency": 3.1,
        "avg_context_relevance": 0.82,
        "latency_over_time": [
            {"timestamp": 1_714_557_600_000_i64, "value": "1.4"},
            {"timestamp": 1_714_561_200_000_i64, "value": 1.6},
        ],
    }))
    .into_response()
}

async fn session_metrics(
    State(_recorded): State<Shared>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "session_id": session_id,
        "metrics": [{"latency": 1.0}, {"latency": 1.5}],
        "summary": {
            "total_interactions": 2,
            "avg_latency": 1.25,
            "avg_relevance_score": 0.8,
            "start_time": "1714557600000",
            "end_time": "1714561200000",
        },
    }))
    .into_response()
}

#[derive(Deserialize)]
struct ChatQuery {
    session_id: String,
}

async fn chat(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<ChatQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    {
        let mut recorded = recorded.lock().unwrap();
        recorded.chat_auth.push(auth.clone());
        recorded.chat_sessions.push(query.session_id);
    }
    match auth.as_deref().and_then(|v| v.strip_prefix("Bearer ")) {
        Some(EXPIRED_TOKEN) => unauthorized(),
        Some(REVOKED_TOKEN) => ws.on_upgrade(|mut socket| async move {
            let frame = CloseFrame {
                code: close_code::POLICY,
                reason: Utf8Bytes::from_static("Invalid token"),
            };
            let _ = socket.send(Message::Close(Some(frame))).await;
        }),
        _ => ws.on_upgrade(|socket| handle_chat(socket, recorded)),
    }
}

/// Replies to each frame based on its `content`:
/// - `raw please`: answers with plain, non-JSON text
/// - `bye`: closes the socket
/// - anything else: answers `{"content": "Echo: <content>", "sender": "agent"}`
async fn handle_chat(mut socket: WebSocket, recorded: Shared) {
    while let Some(Ok(frame)) = socket.recv().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let text = text.to_string();
        recorded.lock().unwrap().frames.push(text.clone());

        let content = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v["content"].as_str().map(String::from))
            .unwrap_or(text);
        let reply = match content.as_str() {
            "raw please" => "Plain text from the agent".to_string(),
            "bye" => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            other => json!({"content": format!("Echo: {other}"), "sender": "agent"}).to_string(),
        };
        if socket.send(Message::Text(reply.into())).await.is_err() {
            return;
        }
    }
}
