use image::DynamicImage;
use notebox_core::{BoundingBox, PageContext, TextBlock};
use notebox_ocr::RegionRasterizer;

use crate::error::PdfError;

pub const POINTS_PER_INCH: f64 = 72.0;

/// Pixels per PDF point at `dpi`.
pub fn dpi_scale(dpi: f32) -> f64 {
    f64::from(dpi) / POINTS_PER_INCH
}

/// A rendered page together with the pixels-per-point factor it was drawn at.
#[derive(Debug, Clone)]
pub struct PageRaster {
    image: DynamicImage,
    scale: f64,
}

impl PageRaster {
    pub fn new(image: DynamicImage, scale: f64) -> Self {
        Self { image, scale }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Pixel window `(x, y, width, height)` covering `bbox`, clamped to the
    /// raster. `None` when nothing of the box is on the page.
    pub fn pixel_window(&self, bbox: &BoundingBox) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (f64::from(self.image.width()), f64::from(self.image.height()));
        let left = (bbox.x0 * self.scale).floor().clamp(0.0, w);
        let top = (bbox.y0 * self.scale).floor().clamp(0.0, h);
        let right = (bbox.x1 * self.scale).ceil().clamp(0.0, w);
        let bottom = (bbox.y1 * self.scale).ceil().clamp(0.0, h);
        if right <= left || bottom <= top {
            return None;
        }
        Some((left as u32, top as u32, (right - left) as u32, (bottom - top) as u32))
    }

    /// The part of the page under `bbox`, at the raster's own resolution.
    pub fn crop(&self, bbox: &BoundingBox) -> Result<DynamicImage, PdfError> {
        let (x, y, w, h) = self
            .pixel_window(bbox)
            .ok_or_else(|| PdfError::EmptyRegion(bbox.to_string()))?;
        Ok(self.image.crop_imm(x, y, w, h))
    }
}

impl RegionRasterizer for PageRaster {
    type Error = PdfError;

    fn rasterize_region(&self, bbox: &BoundingBox, dpi: f32) -> Result<DynamicImage, PdfError> {
        let region = self.crop(bbox)?;
        let ratio = dpi_scale(dpi) / self.scale;
        if (ratio - 1.0).abs() < 1e-3 {
            return Ok(region);
        }
        let w = ((f64::from(region.width()) * ratio).round() as u32).max(1);
        let h = ((f64::from(region.height()) * ratio).round() as u32).max(1);
        Ok(region.resize_exact(w, h, image::imageops::FilterType::Lanczos3))
    }
}

/// Everything the pipeline needs from one page, read once at load time.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub context: PageContext,
    pub blocks: Vec<TextBlock>,
    pub raster: PageRaster,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    // 100 x 200 pt page rendered at 144 dpi.
    fn raster() -> PageRaster {
        let img = RgbImage::from_pixel(200, 400, Rgb([255, 255, 255]));
        PageRaster::new(DynamicImage::ImageRgb8(img), dpi_scale(144.0))
    }

    #[test]
    fn crop_maps_points_to_pixels() {
        let crop = raster().crop(&BoundingBox::new(10.0, 20.0, 60.0, 70.0)).unwrap();
        assert_eq!((crop.width(), crop.height()), (100, 100));
    }

    #[test]
    fn crop_clamps_to_page() {
        let window = raster().pixel_window(&BoundingBox::new(-25.0, -25.0, 50.0, 300.0));
        assert_eq!(window, Some((0, 0, 100, 400)));
    }

    #[test]
    fn region_off_the_page_is_an_error() {
        let err = raster().crop(&BoundingBox::new(150.0, 10.0, 180.0, 20.0)).unwrap_err();
        assert!(matches!(err, PdfError::EmptyRegion(_)));
    }

    #[test]
    fn rasterize_region_rescales_to_requested_dpi() {
        let r = raster();
        let bbox = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let same = r.rasterize_region(&bbox, 144.0).unwrap();
        assert_eq!(same.width(), 100);
        let half = r.rasterize_region(&bbox, 72.0).unwrap();
        assert_eq!((half.width(), half.height()), (50, 50));
    }
}
