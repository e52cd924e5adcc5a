use image::DynamicImage;
use notebox_core::{BoundingBox, Rectangle};
use std::fmt;
use tracing::{debug, warn};

use crate::preprocess::prepare_for_ocr;
use crate::recognizer::OcrBackend;

/// Anything that can produce a raster of a page clipped to a box.
pub trait RegionRasterizer {
    type Error: fmt::Display;

    fn rasterize_region(&self, bbox: &BoundingBox, dpi: f32) -> Result<DynamicImage, Self::Error>;
}

/// Recovers text for regions of scanned pages by OCR-ing their rasters.
///
/// Every failure along the way (raster, preprocessing, recognition) is logged
/// and counts as "no text"; it never aborts the document.
pub struct ScanFallback<'a> {
    backend: &'a dyn OcrBackend,
    dpi: f32,
}

impl<'a> ScanFallback<'a> {
    pub fn new(backend: &'a dyn OcrBackend, dpi: f32) -> Self {
        Self { backend, dpi }
    }

    /// Trimmed OCR text for one region, empty when nothing was recognized.
    pub fn recognize<P>(&self, rect: &Rectangle, page: &P) -> String
    where
        P: RegionRasterizer + ?Sized,
    {
        if !self.backend.is_available() {
            return String::new();
        }

        let raster = match page.rasterize_region(&rect.bbox, self.dpi) {
            Ok(img) => img,
            Err(e) => {
                warn!(bbox = %rect.bbox, error = %e, "could not rasterize region for OCR");
                return String::new();
            }
        };
        let png = match prepare_for_ocr(&raster) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(bbox = %rect.bbox, error = %e, "could not prepare region for OCR");
                return String::new();
            }
        };
        match self.backend.recognize(&png) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(bbox = %rect.bbox, error = %e, "OCR failed; keeping extracted text");
                String::new()
            }
        }
    }

    /// Replace each rectangle's text with its OCR result when one was found.
    /// Returns how many rectangles changed.
    pub fn apply<P>(&self, rects: &mut [Rectangle], page: &P) -> usize
    where
        P: RegionRasterizer + ?Sized,
    {
        if !self.backend.is_available() {
            return 0;
        }
        let mut replaced = 0;
        for rect in rects.iter_mut() {
            let text = self.recognize(rect, page);
            if !text.is_empty() {
                debug!(bbox = %rect.bbox, chars = text.len(), "OCR text recovered");
                rect.text = text;
                replaced += 1;
            }
        }
        replaced
    }
}
