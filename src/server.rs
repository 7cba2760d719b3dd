//! HTTP API for the resume chatbot.
//!
//! # Endpoints
//!
//! | Method   | Path                    | Description |
//! |----------|-------------------------|-------------|
//! | `GET`    | `/`                     | Service banner |
//! | `GET`    | `/health`               | Health check (returns version) |
//! | `GET`    | `/api/status`           | Engine status |
//! | `POST`   | `/api/upload`           | Upload a PDF resume and load it |
//! | `POST`   | `/api/initialize`       | Load the configured resume (`?force_reload=true` to reload) |
//! | `POST`   | `/api/chat`             | Ask a question |
//! | `GET`    | `/api/sample-questions` | Suggested questions |
//! | `DELETE` | `/api/reset`            | Discard the active engine |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Message cannot be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `no_document` (400), `internal` (500).
//!
//! Answerer failures are not HTTP errors: `/api/chat` still returns 200
//! with the apology text and an `error` field.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser frontend
//! can be served from anywhere.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::engine::{Answer, InitOutcome};
use crate::error::PipelineError;
use crate::session::Session;

pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "What are your main technical skills?",
    "Tell me about your work experience",
    "What projects have you worked on?",
    "What's your educational background?",
    "What are your certifications?",
];

const NO_RESUME: &str = "No resume uploaded";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Session>,
    /// Every upload overwrites this file.
    upload_path: Arc<PathBuf>,
    /// Serializes uploads across the file write and the engine swap.
    upload_lock: Arc<Mutex<()>>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(session: Arc<Session>, config: &Config) -> Self {
        Self {
            session,
            upload_path: Arc::new(config.upload_path()),
            upload_lock: Arc::new(Mutex::new(())),
            max_upload_bytes: config.upload.max_bytes,
        }
    }
}

/// Build the router with every route, CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/status", get(handle_status))
        .route(
            "/api/upload",
            post(handle_upload).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/api/initialize", post(handle_initialize))
        .route("/api/chat", post(handle_chat))
        .route("/api/sample-questions", get(handle_sample_questions))
        .route("/api/reset", delete(handle_reset))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind` and runs until the process is terminated. With
/// `[document].preload` set, the configured resume is loaded before the
/// listener opens.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let session = Arc::new(Session::from_config(config)?);

    if config.document.preload {
        let path = session
            .document_path()
            .await
            .context("document.preload is set but no document.path is configured")?;
        let outcome = session.install(path).await;
        if outcome.is_success() {
            tracing::info!(message = %outcome.message, "preloaded resume");
        } else {
            tracing::warn!(message = %outcome.message, "preload failed");
        }
    }

    tokio::fs::create_dir_all(&config.upload.dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload.dir.display()))?;

    let app = build_router(AppState::new(session, config));

    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("resume chat listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NoDocumentLoaded => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "no_document",
                message: err.to_string(),
            },
            e if e.is_client_fault() => bad_request(e.to_string()),
            e => internal(e.to_string()),
        }
    }
}

// ============ GET / and /health ============

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "online",
        message: "Resume chat API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/status ============

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    initialized: bool,
    content_length: usize,
    /// File name of the active document, or "No resume uploaded".
    document_path: String,
    has_document: bool,
}

async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.session.status().await;
    let document_path = status
        .document_path
        .as_deref()
        .map(display_name)
        .unwrap_or_else(|| NO_RESUME.to_string());
    Json(StatusResponse {
        status: "online",
        initialized: status.initialized,
        content_length: status.content_length,
        document_path,
        has_document: status.has_document,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============ POST /api/upload ============

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    message: String,
    filename: String,
    content_length: usize,
}

/// Handler for `POST /api/upload`.
///
/// Reads the multipart `file` field, writes it over the upload slot and
/// installs a freshly loaded engine. Returns `400` for a missing field or a
/// non-PDF file name and `500` when the document cannot be processed.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let (filename, bytes) = read_file_field(&mut multipart).await?;

    let _guard = state.upload_lock.lock().await;
    let path = state.upload_path.as_ref().clone();
    save_upload(&path, &bytes)
        .await
        .map_err(|e| internal(format!("Failed to save upload: {}", e)))?;
    tracing::info!(filename = %filename, bytes = bytes.len(), path = %path.display(), "resume uploaded");

    let outcome = state.session.install(path).await;
    if !outcome.is_success() {
        return Err(internal(outcome.message));
    }

    Ok(Json(UploadResponse {
        status: "success",
        message: "Resume uploaded and processed successfully!".to_string(),
        filename,
        content_length: outcome.content_length.unwrap_or(0),
    }))
}

/// Replace `path` with `bytes` atomically.
///
/// The bytes go to a sibling `.part` file that is then renamed over the
/// slot, so an engine reading the slot concurrently sees either the old
/// file or the new one in full.
async fn save_upload(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let mut staging_name = path.file_name().unwrap_or_default().to_os_string();
    staging_name.push(".part");
    let staging = path.with_file_name(staging_name);

    tokio::fs::write(&staging, bytes).await?;
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e);
    }
    Ok(())
}

async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(bad_request("Only PDF files are allowed"));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(bad_request("missing multipart field: file"))
}

// ============ POST /api/initialize ============

#[derive(Deserialize)]
struct InitializeParams {
    #[serde(default)]
    force_reload: bool,
}

/// Handler for `POST /api/initialize`.
///
/// Load failures come back as a `200` with `status: "error"`; only a
/// missing document path is an HTTP error.
async fn handle_initialize(
    State(state): State<AppState>,
    Query(params): Query<InitializeParams>,
) -> Result<Json<InitOutcome>, AppError> {
    let engine = state.session.get_or_create(None).await?;
    Ok(Json(engine.initialize(params.force_reload).await))
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    context_chunks: Option<usize>,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Answer>, AppError> {
    let answer = state.session.query(&req.message, req.context_chunks).await?;
    Ok(Json(answer))
}

// ============ GET /api/sample-questions ============

#[derive(Serialize)]
struct SampleQuestions {
    questions: [&'static str; 5],
}

async fn handle_sample_questions() -> Json<SampleQuestions> {
    Json(SampleQuestions {
        questions: SAMPLE_QUESTIONS,
    })
}

// ============ DELETE /api/reset ============

#[derive(Serialize)]
struct ResetResponse {
    status: &'static str,
    message: &'static str,
}

async fn handle_reset(State(state): State<AppState>) -> Json<ResetResponse> {
    state.session.reset().await;
    Json(ResetResponse {
        status: "success",
        message: "System reset successfully",
    })
}
