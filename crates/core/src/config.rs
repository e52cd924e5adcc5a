use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Knobs for the pure segmentation phase and the rasterization that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Padding applied to every block before the proximity union.
    pub expand_px: f64,
    /// Write per-page diagnostic images with the rectangles drawn on them.
    pub visualize: bool,
    /// Resolution for region crops, OCR rasters and diagnostic images.
    pub resolution_dpi: f32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self { expand_px: 25.0, visualize: true, resolution_dpi: 150.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract data directory; `None` lets the engine use its built-in search path.
    pub tessdata: Option<PathBuf>,
    pub lang: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self { tessdata: None, lang: "eng".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from("out") }
    }
}

/// Top-level configuration, loadable from TOML. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub segmentation: SegmentationConfig,
    pub ocr: OcrSettings,
    pub output: OutputSettings,
}

impl ExtractionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let seg = &self.segmentation;
        if !seg.expand_px.is_finite() || seg.expand_px < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "segmentation.expand_px must be a non-negative number, got {}",
                seg.expand_px
            )));
        }
        if !seg.resolution_dpi.is_finite() || seg.resolution_dpi <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "segmentation.resolution_dpi must be positive, got {}",
                seg.resolution_dpi
            )));
        }
        if self.ocr.lang.trim().is_empty() {
            return Err(ConfigError::Invalid("ocr.lang must not be empty".into()));
        }
        Ok(())
    }
}
