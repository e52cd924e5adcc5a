use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use notebox_core::Rectangle;
use tracing::{debug, info};

use crate::page::PageRaster;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

// Sizes in PDF points; scaled by the raster's pixels-per-point.
const BORDER_WIDTH: f64 = 0.8;
const LABEL_SIZE: f64 = 8.0;
const LABEL_DX: f64 = -10.0;
const LABEL_DY: f64 = -6.0;

const FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Draws numbered region outlines over a page raster.
pub struct Overlay {
    font: Option<FontVec>,
}

impl Overlay {
    /// Labels need a font; without one only the outlines are drawn.
    pub fn with_system_font() -> Self {
        for path in FONT_PATHS {
            if let Ok(data) = std::fs::read(path) {
                if let Ok(font) = FontVec::try_from_vec(data) {
                    info!(font = path, "overlay font loaded");
                    return Self { font: Some(font) };
                }
            }
        }
        debug!("no system font found; region labels will be skipped");
        Self::outlines_only()
    }

    pub fn outlines_only() -> Self {
        Self { font: None }
    }

    pub fn has_labels(&self) -> bool {
        self.font.is_some()
    }

    /// Copy of the page with each rectangle outlined in red and numbered
    /// from 1 in blue just above its top-left corner.
    pub fn draw(&self, raster: &PageRaster, rects: &[Rectangle]) -> RgbImage {
        let mut canvas = raster.image().to_rgb8();
        let scale = raster.scale();
        let thickness = ((BORDER_WIDTH * scale).round() as u32).max(1);

        for (i, rect) in rects.iter().enumerate() {
            let Some((x, y, w, h)) = raster.pixel_window(&rect.bbox) else {
                continue;
            };
            for t in 0..thickness {
                if w <= 2 * t || h <= 2 * t {
                    break;
                }
                let ring = Rect::at((x + t) as i32, (y + t) as i32).of_size(w - 2 * t, h - 2 * t);
                draw_hollow_rect_mut(&mut canvas, ring, BOX_COLOR);
            }

            if let Some(font) = &self.font {
                let lx = ((rect.bbox.x0 + LABEL_DX) * scale).round() as i32;
                // The anchor is the label's baseline; draw_text_mut wants its top.
                let ly = ((rect.bbox.y0 + LABEL_DY - LABEL_SIZE) * scale).round() as i32;
                let size = (LABEL_SIZE * scale) as f32;
                draw_text_mut(
                    &mut canvas,
                    LABEL_COLOR,
                    lx.max(0),
                    ly.max(0),
                    size,
                    font,
                    &(i + 1).to_string(),
                );
            }
        }
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use notebox_core::BoundingBox;

    fn white_page() -> PageRaster {
        let img = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        PageRaster::new(DynamicImage::ImageRgb8(img), 1.0)
    }

    #[test]
    fn outlines_are_red_and_interior_untouched() {
        let rects = vec![Rectangle::new(BoundingBox::new(10.0, 10.0, 50.0, 60.0), "a")];
        let out = Overlay::outlines_only().draw(&white_page(), &rects);

        assert_eq!(out.get_pixel(10, 10), &BOX_COLOR);
        assert_eq!(out.get_pixel(49, 30), &BOX_COLOR);
        assert_eq!(out.get_pixel(30, 30), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(80, 80), &Rgb([255, 255, 255]));
    }

    #[test]
    fn rectangles_off_the_page_are_skipped() {
        let rects = vec![Rectangle::new(BoundingBox::new(200.0, 200.0, 250.0, 250.0), "")];
        let out = Overlay::outlines_only().draw(&white_page(), &rects);
        assert!(out.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn source_raster_is_not_modified() {
        let page = white_page();
        let rects = vec![Rectangle::new(BoundingBox::new(0.0, 0.0, 20.0, 20.0), "")];
        let _ = Overlay::outlines_only().draw(&page, &rects);
        assert_eq!(page.image().to_rgb8().get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn labels_are_blue_and_sit_above_the_box() {
        let Some(font) = FONT_PATHS
            .iter()
            .filter_map(|path| std::fs::read(path).ok())
            .find_map(|data| FontVec::try_from_vec(data).ok())
        else {
            return;
        };
        let overlay = Overlay { font: Some(font) };
        assert!(overlay.has_labels());

        let img = RgbImage::from_pixel(400, 400, Rgb([255, 255, 255]));
        let page = PageRaster::new(DynamicImage::ImageRgb8(img), 2.0);
        let rects = vec![Rectangle::new(BoundingBox::new(50.0, 50.0, 150.0, 150.0), "")];
        let out = overlay.draw(&page, &rects);

        let is_label = |p: &Rgb<u8>| p[2] == 255 && p[0] < 128 && p[1] < 128;
        let above = out.enumerate_pixels().filter(|(_, y, p)| *y < 100 && is_label(p)).count();
        let inside = out
            .enumerate_pixels()
            .filter(|(x, y, p)| (110..290).contains(x) && (110..290).contains(y) && is_label(p))
            .count();
        assert!(above > 0);
        assert_eq!(inside, 0);
        assert_eq!(out.get_pixel(100, 200), &BOX_COLOR);
    }
}
