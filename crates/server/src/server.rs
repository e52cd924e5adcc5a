//! HTTP upload endpoint for contract-note extraction.

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use notebox_core::{Classification, ClassifiedRegion};
use notebox_pdf::{NoteProcessor, ProcessError};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// What the upload handler needs from the extraction pipeline.
pub trait NoteExtractor: Send + Sync {
    fn extract(&self, pdf: &Path, out_dir: &Path) -> Result<Classification, ProcessError>;
}

impl NoteExtractor for NoteProcessor {
    fn extract(&self, pdf: &Path, out_dir: &Path) -> Result<Classification, ProcessError> {
        self.process(pdf, out_dir).map(|report| report.classification)
    }
}

pub struct AppState {
    extractor: Arc<dyn NoteExtractor>,
    output_root: PathBuf,
    discard_outputs: bool,
}

impl AppState {
    pub fn new(extractor: Arc<dyn NoteExtractor>, output_root: PathBuf, discard_outputs: bool) -> Self {
        Self { extractor, output_root, discard_outputs }
    }

    /// Spool the upload to a temp file and run it in its own working directory.
    /// The spool is always removed; the working directory only when discarding.
    fn extract_upload(&self, id: Uuid, bytes: &[u8]) -> anyhow::Result<Classification> {
        let mut spool = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile()
            .context("creating upload spool file")?;
        spool.write_all(bytes)?;
        spool.flush()?;

        let work_dir = self.output_root.join(id.to_string());
        let result = self.extractor.extract(spool.path(), &work_dir);

        if self.discard_outputs && work_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&work_dir) {
                warn!(request_id = %id, error = %e, "could not remove upload working directory");
            }
        }
        Ok(result?)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    sender_blocks: Vec<ClassifiedRegion>,
    receiver_blocks: Vec<ClassifiedRegion>,
}

impl From<Classification> for UploadResponse {
    fn from(c: Classification) -> Self {
        Self { sender_blocks: c.sender, receiver_blocks: c.receiver }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { detail: detail.into() })).into_response()
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/upload_file", post(upload_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: ServerConfig, extractor: Arc<dyn NoteExtractor>) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.output_root)
        .with_context(|| format!("creating output root {}", config.output_root.display()))?;

    let state = Arc::new(AppState::new(extractor, config.output_root.clone(), config.discard_outputs));
    let app = router(state, config.max_upload_bytes);

    let addr = config.addr()?;
    info!("Server listening on http://{}", addr);
    info!("  GET  /health      - Health check");
    info!("  POST /upload_file - Contract note extraction");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn upload_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let request_id = Uuid::new_v4();

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };
        if field.name() != Some("file") {
            continue;
        }
        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            info!(request_id = %request_id, content_type = ?field.content_type(), "rejected upload");
            return error_response(StatusCode::BAD_REQUEST, "Upload a PDF file");
        }
        let name = field.file_name().unwrap_or("upload.pdf").to_string();
        match field.bytes().await {
            Ok(bytes) => {
                upload = Some((name, bytes));
                break;
            }
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        }
    }
    let Some((file_name, bytes)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing `file` field");
    };
    info!(request_id = %request_id, file = %file_name, bytes = bytes.len(), "processing upload");

    let start = Instant::now();
    let worker = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || worker.extract_upload(request_id, &bytes)).await;

    match outcome {
        Ok(Ok(classification)) => {
            info!(
                request_id = %request_id,
                senders = classification.sender.len(),
                receivers = classification.receiver.len(),
                total_ms = start.elapsed().as_secs_f64() * 1000.0,
                "upload processed"
            );
            (StatusCode::OK, Json(UploadResponse::from(classification))).into_response()
        }
        Ok(Err(e)) => {
            error!(request_id = %request_id, error = %e, "extraction failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Extraction failed: {e}"))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "extraction task panicked");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Extraction task failed")
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown..."),
    }
}
