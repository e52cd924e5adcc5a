use notebox_core::OcrSettings;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available; build with the `tesseract` feature")]
    NotAvailable,
}

/// Reads text out of a PNG-encoded region raster.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;

    /// `false` when the backend can never produce text, which lets callers skip
    /// rasterizing regions nobody will read.
    fn is_available(&self) -> bool {
        true
    }
}

// ── Null backend (OCR unavailable) ────────────────────────────────────────────

/// Stands in when no OCR engine could be set up. Always yields empty text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecognizer;

impl OcrBackend for NullRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(String::new())
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ── Test doubles ──────────────────────────────────────────────────────────────

/// Recognizes every region as the same fixed text.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

/// Always fails; exercises the error-swallowing paths.
pub struct FailingRecognizer;

impl OcrBackend for FailingRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::Engine("recognizer failure".into()))
    }
}

// ── Tesseract (feature `tesseract`) ───────────────────────────────────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        /// Builds the recognizer after checking that the engine loads with the
        /// given data path and language.
        pub fn new(data_path: Option<String>, lang: &str) -> Result<Self, OcrError> {
            LepTess::new(data_path.as_deref(), lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(Self { data_path, lang: lang.to_string() })
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

/// Pick the OCR backend once, at start-up. Falls back to [`NullRecognizer`]
/// (with a single warning) when Tesseract is not compiled in or fails to load.
pub fn recognizer_from_settings(settings: &OcrSettings) -> Box<dyn OcrBackend> {
    match tesseract(settings) {
        Ok(backend) => {
            info!(lang = %settings.lang, "OCR enabled");
            backend
        }
        Err(e) => {
            warn!(error = %e, "OCR unavailable; scanned pages will keep empty text");
            Box::new(NullRecognizer)
        }
    }
}

#[cfg(feature = "tesseract")]
fn tesseract(settings: &OcrSettings) -> Result<Box<dyn OcrBackend>, OcrError> {
    let data_path = settings.tessdata.as_ref().map(|p| p.to_string_lossy().into_owned());
    let backend = tesseract_backend::TesseractRecognizer::new(data_path, &settings.lang)?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "tesseract"))]
fn tesseract(_settings: &OcrSettings) -> Result<Box<dyn OcrBackend>, OcrError> {
    Err(OcrError::NotAvailable)
}
