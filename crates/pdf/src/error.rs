use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to initialize PDFium: {0}")]
    Init(String),
    #[error("Failed to load PDF {path}: {message}")]
    Load { path: PathBuf, message: String },
    #[error("Failed to read text of page {page}: {message}")]
    Text { page: usize, message: String },
    #[error("Failed to render page {page}: {message}")]
    Render { page: usize, message: String },
    #[error("Region {0} lies outside the page raster")]
    EmptyRegion(String),
    #[error("Failed to write PDF {path}: {message}")]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("PDF not found: {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to save image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to serialize rectangles: {0}")]
    Json(#[from] serde_json::Error),
}
