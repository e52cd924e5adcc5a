use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

/// Longest side handed to the OCR engine.
const MAX_SIDE: u32 = 2800;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Region raster is empty")]
    Empty,
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Grayscale, contrast-stretch and PNG-encode a region raster for OCR.
pub fn prepare_for_ocr(region: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    if region.width() == 0 || region.height() == 0 {
        return Err(PreprocessError::Empty);
    }
    encode_png(&normalize(region))
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

fn normalize(img: &DynamicImage) -> DynamicImage {
    let gray: GrayImage = if img.width() > MAX_SIDE || img.height() > MAX_SIDE {
        img.resize(MAX_SIDE, MAX_SIDE, image::imageops::FilterType::Lanczos3).to_luma8()
    } else {
        img.to_luma8()
    };

    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if lo == hi {
        return DynamicImage::ImageLuma8(gray);
    }

    let range = u32::from(hi - lo);
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([(u32::from(p - lo) * 255 / range) as u8])
    });
    DynamicImage::ImageLuma8(stretched)
}
