//! Settings for the upload server.

use anyhow::Context;
use notebox_core::ExtractionConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Each upload gets its own `<output_root>/<uuid>` working directory.
    pub output_root: PathBuf,
    /// Remove each per-upload directory once the response is built.
    pub discard_outputs: bool,
    pub max_upload_bytes: usize,
    pub extraction: ExtractionConfig,
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Extraction settings from `path`, or the defaults when none is given.
pub fn load_extraction_config(path: Option<&Path>) -> anyhow::Result<ExtractionConfig> {
    let config = match path {
        Some(path) => ExtractionConfig::load(path)?,
        None => ExtractionConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
