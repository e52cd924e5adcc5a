//! notebox-server
//!
//! HTTP front end for contract-note region extraction.
//!
//! ```bash
//! notebox-server --port 8000 --output /var/lib/notebox
//! curl -F "file=@note.pdf;type=application/pdf" http://localhost:8000/upload_file
//! ```

mod config;
mod server;

use anyhow::Context;
use clap::Parser;
use notebox_ocr::recognizer_from_settings;
use notebox_pdf::{NoteProcessor, PdfiumBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{load_extraction_config, ServerConfig};

#[derive(Parser)]
#[command(name = "notebox-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract sender and receiver blocks from uploaded contract notes", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "NOTEBOX_HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value_t = 8000, env = "NOTEBOX_PORT")]
    port: u16,

    /// Root for per-upload working directories (defaults to `[output] dir`)
    #[arg(long, env = "NOTEBOX_OUTPUT")]
    output: Option<PathBuf>,

    /// TOML extraction settings
    #[arg(long, env = "NOTEBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Delete each upload's crops, overlays and JSON after responding
    #[arg(long, env = "NOTEBOX_DISCARD_OUTPUTS")]
    discard_outputs: bool,

    /// Largest accepted request body, in megabytes
    #[arg(long, default_value_t = 32, env = "NOTEBOX_MAX_UPLOAD_MB")]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let extraction = load_extraction_config(args.config.as_deref())?;
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        output_root: args.output.unwrap_or_else(|| extraction.output.dir.clone()),
        discard_outputs: args.discard_outputs,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        extraction,
    };

    info!("Initializing extraction pipeline...");
    let backend = PdfiumBackend::new().context("PDFium is required to read uploads")?;
    let ocr = recognizer_from_settings(&config.extraction.ocr);
    let processor = NoteProcessor::new(Box::new(backend), ocr, config.extraction.segmentation.clone());

    info!("Starting server on {}:{}", config.host, config.port);
    server::run_server(config, Arc::new(processor)).await
}
