//! HTTP backend.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload/` | Store and index a `.pdf` or `.txt` file (multipart field `file`) |
//! | `GET`  | `/files/` | List uploaded filenames |
//! | `GET`  | `/search/?query=...` | Retrieve context chunks and generate an answer |
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/health` | Status, version and indexed chunk count |
//!
//! Every path also answers without its trailing slash.
//!
//! # Error Contract
//!
//! Errors are returned as `{"error": "<message>"}` with status 400 for
//! problems with the request and 500 for everything else.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser front end
//! on another port can call the API.

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::answer::AnswerService;
use crate::config::{Config, Secrets};
use crate::embedding::{create_embedder, Embedder};
use crate::error::IngestError;
use crate::generation::{ChatCompletionsGenerator, Generator};
use crate::index::VectorIndex;
use crate::ingest::Ingestor;
use crate::models::{
    ErrorResponse, FilesResponse, HealthResponse, MessageResponse, SearchResponse, UploadResponse,
};
use crate::retrieval::IndexRetriever;
use crate::store::DocumentStore;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    ingestor: Arc<Ingestor>,
    answers: Arc<AnswerService>,
    documents: DocumentStore,
    index: VectorIndex,
    max_upload_bytes: usize,
}

impl AppState {
    /// Open the storage described by `config` and wire the pipeline around
    /// the given embedder and generator.
    pub async fn new(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let documents = DocumentStore::new(&config.storage.document_dir);
        documents.ensure_dir().await?;
        let index = VectorIndex::open(&config.storage.index_path()).await?;

        let retriever = Arc::new(IndexRetriever::new(
            index.clone(),
            embedder.clone(),
            config.retrieval.top_k,
        ));
        let ingestor = Ingestor::new(
            documents.clone(),
            index.clone(),
            embedder,
            config.chunking.clone(),
            config.embedding.batch_size,
        );

        Ok(Self {
            ingestor: Arc::new(ingestor),
            answers: Arc::new(AnswerService::new(retriever, generator)),
            documents,
            index,
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

/// Build the application router with CORS, request tracing and the upload
/// size limit applied.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/upload/", post(handle_upload))
        .route("/upload", post(handle_upload))
        .route("/files/", get(handle_files))
        .route("/files", get(handle_files))
        .route("/search/", get(handle_search))
        .route("/search", get(handle_search))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the backend on `[server].bind` and serves until the process is
/// terminated.
pub async fn run_server(config: &Config, secrets: &Secrets) -> Result<()> {
    let embedder = create_embedder(&config.embedding)?;
    let generator = Arc::new(ChatCompletionsGenerator::new(
        &config.llm,
        secrets.llm_api_key.clone(),
    )?);
    tracing::info!(
        embedding_model = embedder.model_name(),
        dims = embedder.dims(),
        llm_model = %config.llm.model,
        "models configured"
    );

    let state = AppState::new(config, embedder, generator).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("docqa backend listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        if err.is_client_error() {
            bad_request(err.to_string())
        } else {
            tracing::error!(error = %err, "upload failed");
            internal(err.to_string())
        }
    }
}

// ============ GET / and GET /health ============

async fn handle_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Document QA backend is running".to_string(),
    })
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let indexed_chunks = state
        .index
        .count()
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        indexed_chunks,
    }))
}

// ============ POST /upload/ ============

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    loop {
        let field = multipart.next_field().await.map_err(|e| AppError {
            status: e.status(),
            message: e.body_text(),
        })?;
        let Some(field) = field else {
            return Err(bad_request("No file part in the request"));
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| AppError {
            status: e.status(),
            message: e.body_text(),
        })?;

        let report = state.ingestor.ingest(&filename, &bytes).await?;
        return Ok(Json(UploadResponse {
            message: "File processed successfully".to_string(),
            filename: report.filename,
        }));
    }
}

// ============ GET /files/ ============

async fn handle_files(State(state): State<AppState>) -> Result<Json<FilesResponse>, AppError> {
    let uploaded_files = state
        .documents
        .list()
        .await
        .map_err(|e| internal(format!("failed to list documents: {}", e)))?;
    Ok(Json(FilesResponse { uploaded_files }))
}

// ============ GET /search/ ============

#[derive(Deserialize)]
struct SearchParams {
    query: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    tracing::info!(query = %query, "search");
    let response = state.answers.answer(&query).await.map_err(|e| {
        tracing::error!(error = %e, "search failed");
        internal(e.to_string())
    })?;
    Ok(Json(response))
}
