use image::DynamicImage;
use notebox_core::{BoundingBox, PageContext, PageSize, TextBlock};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

use crate::error::PdfError;
use crate::page::{dpi_scale, LoadedPage, PageRaster};

/// Reads pages out of a PDF and writes image-only PDFs.
pub trait PdfBackend: Send + Sync {
    /// Every page's context, text blocks and a raster drawn at `dpi`.
    fn load(&self, path: &Path, dpi: f32) -> Result<Vec<LoadedPage>, PdfError>;

    /// One page per image, each sized to the image at `dpi`.
    fn write_composite(
        &self,
        images: &[DynamicImage],
        dpi: f32,
        dest: &Path,
    ) -> Result<(), PdfError>;
}

// ── PDFium ────────────────────────────────────────────────────────────────────

pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind to a PDFium library next to the binary, in the usual install
    /// prefixes, or wherever the system loader finds one.
    pub fn new() -> Result<Self, PdfError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/usr/local/lib",
                ))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/opt/homebrew/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfError::Init(format!("could not find PDFium library: {e}")))?;
        info!("PDFium bound");
        Ok(Self { pdfium: Pdfium::new(bindings) })
    }

    fn read_page(&self, page: &PdfPage, index: usize, dpi: f32) -> Result<LoadedPage, PdfError> {
        let size = PageSize::new(f64::from(page.width().value), f64::from(page.height().value));

        let text = page.text().map_err(|e| PdfError::Text {
            page: index + 1,
            message: e.to_string(),
        })?;
        let is_digital = !text.all().trim().is_empty();
        let blocks: Vec<TextBlock> = text
            .segments()
            .iter()
            .map(|segment| {
                let b = segment.bounds();
                let bbox = top_left_box(
                    b.left().value,
                    b.top().value,
                    b.right().value,
                    b.bottom().value,
                    size.height,
                );
                TextBlock::new(bbox, segment.text())
            })
            .collect();

        let scale = dpi_scale(dpi);
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale as f32);
        let bitmap = page.render_with_config(&render_config).map_err(|e| PdfError::Render {
            page: index + 1,
            message: e.to_string(),
        })?;
        let image = bitmap.as_image();
        let actual_scale = f64::from(image.width()) / size.width;

        debug!(page = index + 1, blocks = blocks.len(), is_digital, "page loaded");
        Ok(LoadedPage {
            context: PageContext::new(index, size, is_digital),
            blocks,
            raster: PageRaster::new(image, actual_scale),
        })
    }
}

impl PdfBackend for PdfiumBackend {
    fn load(&self, path: &Path, dpi: f32) -> Result<Vec<LoadedPage>, PdfError> {
        let document = self.pdfium.load_pdf_from_file(path, None).map_err(|e| PdfError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        document
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| self.read_page(&page, index, dpi))
            .collect()
    }

    fn write_composite(
        &self,
        images: &[DynamicImage],
        dpi: f32,
        dest: &Path,
    ) -> Result<(), PdfError> {
        let write_err = |e: PdfiumError| PdfError::Write {
            path: dest.to_path_buf(),
            message: e.to_string(),
        };
        let scale = dpi_scale(dpi);

        let mut document = self.pdfium.create_new_pdf().map_err(write_err)?;
        for image in images {
            let width = PdfPoints::new((f64::from(image.width()) / scale) as f32);
            let height = PdfPoints::new((f64::from(image.height()) / scale) as f32);
            let mut page = document
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::Custom(width, height))
                .map_err(write_err)?;
            page.objects_mut()
                .create_image_object(PdfPoints::ZERO, PdfPoints::ZERO, image, Some(width), Some(height))
                .map_err(write_err)?;
        }
        document.save_to_file(dest).map_err(write_err)
    }
}

/// PDFium reports rectangles with the origin at the bottom-left; flip them.
fn top_left_box(left: f32, top: f32, right: f32, bottom: f32, page_height: f64) -> BoundingBox {
    BoundingBox::new(
        f64::from(left),
        page_height - f64::from(top),
        f64::from(right),
        page_height - f64::from(bottom),
    )
}
