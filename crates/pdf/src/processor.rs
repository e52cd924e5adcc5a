use notebox_core::{
    classify, flatten_groups, group_records, Classification, RecordGroup, Rectangle,
    SegmentationConfig, Segmenter,
};
use notebox_ocr::{OcrBackend, ScanFallback};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::artifacts::{self, crop_file_name, overlay_file_name, COMPOSITE_PDF};
use crate::backend::PdfBackend;
use crate::error::ProcessError;
use crate::page::LoadedPage;
use crate::visualize::Overlay;

/// Everything one run produced, in page order.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub pages: usize,
    pub rectangles: Vec<Rectangle>,
    pub groups: Vec<RecordGroup>,
    pub classification: Classification,
    pub output_dir: PathBuf,
}

/// Turns a contract-note PDF into regions, crops and sender/receiver tags.
///
/// Every page is segmented before OCR runs or any region is written out.
pub struct NoteProcessor {
    backend: Box<dyn PdfBackend>,
    ocr: Box<dyn OcrBackend>,
    segmenter: Segmenter,
    config: SegmentationConfig,
    overlay: Option<Overlay>,
}

impl NoteProcessor {
    pub fn new(
        backend: Box<dyn PdfBackend>,
        ocr: Box<dyn OcrBackend>,
        config: SegmentationConfig,
    ) -> Self {
        let overlay = config.visualize.then(Overlay::with_system_font);
        Self { backend, ocr, segmenter: Segmenter::contract_note(), config, overlay }
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Rectangles for each page, before any OCR.
    pub fn segment_pages(&self, pages: &[LoadedPage]) -> Vec<Vec<Rectangle>> {
        pages
            .iter()
            .map(|page| self.segmenter.segment(&page.blocks, &page.context, &self.config))
            .collect()
    }

    pub fn process(&self, pdf: &Path, out_dir: &Path) -> Result<ExtractionReport, ProcessError> {
        if !pdf.is_file() {
            return Err(ProcessError::NotFound(pdf.to_path_buf()));
        }
        fs::create_dir_all(out_dir)?;
        artifacts::clean_output_dir(out_dir)?;

        let dpi = self.config.resolution_dpi;
        let pages = self.backend.load(pdf, dpi)?;
        info!(pdf = %pdf.display(), pages = pages.len(), "processing contract note");

        let mut per_page = self.segment_pages(&pages);
        let fallback = ScanFallback::new(self.ocr.as_ref(), dpi);
        let mut rectangles: Vec<Rectangle> = Vec::new();
        let mut crops = Vec::new();

        for (page, rects) in pages.iter().zip(per_page.iter_mut()) {
            let number = page.context.index + 1;
            if page.context.is_digital {
                info!(page = number, rectangles = rects.len(), "digital page");
            } else {
                let recovered = fallback.apply(rects, &page.raster);
                info!(page = number, rectangles = rects.len(), recovered, "scanned page");
            }

            if let Some(overlay) = &self.overlay {
                let path = out_dir.join(overlay_file_name(number));
                overlay.draw(&page.raster, rects).save(&path)?;
                debug!(path = %path.display(), "saved overlay");
            }

            for rect in rects.iter() {
                rectangles.push(rect.clone());
                match page.raster.crop(&rect.bbox) {
                    Ok(crop) => {
                        crop.save(out_dir.join(crop_file_name(number, rectangles.len())))?;
                        crops.push(crop);
                    }
                    Err(e) => warn!(page = number, error = %e, "skipping crop"),
                }
            }
        }

        let groups = group_records(&rectangles);
        artifacts::write_groups(out_dir, &groups)?;

        if crops.is_empty() {
            warn!("no cropped regions; composite PDF not written");
        } else {
            self.backend.write_composite(&crops, dpi, &out_dir.join(COMPOSITE_PDF))?;
        }

        let classification = classify(&flatten_groups(&groups));
        info!(
            rectangles = rectangles.len(),
            senders = classification.sender.len(),
            receivers = classification.receiver.len(),
            "contract note processed"
        );

        Ok(ExtractionReport {
            pages: pages.len(),
            rectangles,
            groups,
            classification,
            output_dir: out_dir.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::page::PageRaster;
    use image::{DynamicImage, Rgb, RgbImage};
    use notebox_core::{BoundingBox, PageContext, PageSize, TextBlock};
    use notebox_ocr::{MockRecognizer, NullRecognizer};
    use std::sync::{Arc, Mutex};

    const A4: PageSize = PageSize { width: 595.0, height: 842.0 };
    const SCALE: f64 = 0.25;

    struct StubBackend {
        pages: Vec<(bool, Vec<TextBlock>)>,
        composites: Arc<Mutex<Vec<usize>>>,
    }

    impl StubBackend {
        fn new(pages: Vec<(bool, Vec<TextBlock>)>) -> Self {
            Self { pages, composites: Arc::default() }
        }
    }

    impl PdfBackend for StubBackend {
        fn load(&self, _path: &Path, _dpi: f32) -> Result<Vec<LoadedPage>, PdfError> {
            Ok(self
                .pages
                .iter()
                .enumerate()
                .map(|(index, (is_digital, blocks))| {
                    let w = (A4.width * SCALE) as u32;
                    let h = (A4.height * SCALE) as u32;
                    let img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
                    LoadedPage {
                        context: PageContext::new(index, A4, *is_digital),
                        blocks: blocks.clone(),
                        raster: PageRaster::new(DynamicImage::ImageRgb8(img), SCALE),
                    }
                })
                .collect())
        }

        fn write_composite(&self, images: &[DynamicImage], _dpi: f32, dest: &Path) -> Result<(), PdfError> {
            self.composites.lock().unwrap().push(images.len());
            fs::write(dest, b"%PDF-stub").map_err(|e| PdfError::Write {
                path: dest.to_path_buf(),
                message: e.to_string(),
            })
        }
    }

    fn block(x0: f64, y0: f64, x1: f64, y1: f64, text: &str) -> TextBlock {
        TextBlock::new(BoundingBox::new(x0, y0, x1, y1), text)
    }

    fn five_page_note() -> Vec<(bool, Vec<TextBlock>)> {
        let first = vec![
            block(30.0, 20.0, 300.0, 40.0, "Zerodha Broking Ltd"),
            block(30.0, 50.0, 300.0, 70.0, "Client: Jane Doe"),
            block(320.0, 50.0, 560.0, 90.0, "PAN: ABCDE1234F"),
            block(30.0, 120.0, 560.0, 140.0, "Contract Note No: CNT-24/25-1"),
            block(30.0, 150.0, 560.0, 700.0, "Trade table"),
        ];
        let two_blocks = vec![
            block(40.0, 60.0, 500.0, 80.0, "Para one"),
            block(40.0, 100.0, 500.0, 400.0, "Para two"),
        ];
        let fourth = vec![
            block(40.0, 60.0, 500.0, 300.0, "Summary"),
            block(40.0, 680.0, 300.0, 700.0, "Date: 01-04-2024"),
        ];
        vec![
            (true, first),
            (true, two_blocks.clone()),
            (true, two_blocks.clone()),
            (true, fourth),
            (true, two_blocks),
        ]
    }

    fn config(visualize: bool) -> SegmentationConfig {
        SegmentationConfig { visualize, ..SegmentationConfig::default() }
    }

    fn input_pdf(dir: &Path) -> PathBuf {
        let path = dir.join("note.pdf");
        fs::write(&path, b"%PDF-1.7").unwrap();
        path
    }

    fn processor(
        backend: StubBackend,
        ocr: Box<dyn OcrBackend>,
        visualize: bool,
    ) -> (NoteProcessor, Arc<Mutex<Vec<usize>>>) {
        let composites = Arc::clone(&backend.composites);
        (NoteProcessor::new(Box::new(backend), ocr, config(visualize)), composites)
    }

    #[test]
    fn five_page_note_yields_six_regions_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let (p, composites) = processor(StubBackend::new(five_page_note()), Box::new(NullRecognizer), true);

        let report = p.process(&input_pdf(dir.path()), &out).unwrap();

        assert_eq!(report.pages, 5);
        assert_eq!(report.rectangles.len(), 6);
        assert_eq!(report.rectangles[4].bbox.y1, 780.0);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].len(), 6);

        for name in [
            "page_1rect1.png",
            "page_1rect2.png",
            "page_2rect3.png",
            "page_3rect4.png",
            "page_4rect5.png",
            "page_5rect6.png",
            "page_1_boxes.png",
            "page_5_boxes.png",
            "all_rectangles_6_per_line.json",
            "all_cropped_images.pdf",
        ] {
            assert!(out.join(name).is_file(), "{name} missing");
        }
        assert_eq!(*composites.lock().unwrap(), vec![6]);

        let senders: Vec<usize> = report.classification.sender.iter().map(|(i, _)| *i).collect();
        assert_eq!(senders, vec![1]);
        assert!(report.classification.receiver.is_empty());
    }

    #[test]
    fn scanned_page_text_comes_from_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let (p, _) = processor(
            StubBackend::new(vec![(false, Vec::new())]),
            Box::new(MockRecognizer::new("Sender: Zerodha Broking\n")),
            false,
        );

        let report = p.process(&input_pdf(dir.path()), dir.path()).unwrap();

        assert_eq!(report.rectangles.len(), 1);
        assert_eq!(report.rectangles[0].bbox, A4.full_box());
        assert_eq!(report.rectangles[0].text, "Sender: Zerodha Broking");
        assert_eq!(report.classification.sender.len(), 1);
    }

    #[test]
    fn scanned_page_without_ocr_keeps_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let (p, _) = processor(StubBackend::new(vec![(false, Vec::new())]), Box::new(NullRecognizer), false);
        let report = p.process(&input_pdf(dir.path()), dir.path()).unwrap();
        assert_eq!(report.rectangles[0].text, "");
        assert!(report.classification.sender.is_empty());
    }

    #[test]
    fn missing_pdf_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (p, _) = processor(StubBackend::new(five_page_note()), Box::new(NullRecognizer), false);
        let err = p.process(&dir.path().join("absent.pdf"), dir.path()).unwrap_err();
        assert!(matches!(err, ProcessError::NotFound(_)));
        assert_eq!(err.to_string(), format!("PDF not found: {}", dir.path().join("absent.pdf").display()));
    }

    #[test]
    fn empty_digital_page_skips_composite() {
        let dir = tempfile::tempdir().unwrap();
        let (p, composites) = processor(StubBackend::new(vec![(true, Vec::new())]), Box::new(NullRecognizer), false);

        let report = p.process(&input_pdf(dir.path()), dir.path()).unwrap();

        assert!(report.rectangles.is_empty());
        assert!(composites.lock().unwrap().is_empty());
        assert!(!dir.path().join(COMPOSITE_PDF).exists());
        let json = fs::read_to_string(dir.path().join(artifacts::RECTANGLES_JSON)).unwrap();
        assert_eq!(json.trim(), "[]");
    }

    #[test]
    fn stale_outputs_are_replaced_and_others_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page_9rect42.png"), b"old").unwrap();
        fs::write(dir.path().join("page_7_boxes.png"), b"old").unwrap();
        fs::write(dir.path().join("readme.txt"), b"keep").unwrap();
        let (p, _) = processor(StubBackend::new(five_page_note()), Box::new(NullRecognizer), false);

        p.process(&input_pdf(dir.path()), dir.path()).unwrap();

        assert!(!dir.path().join("page_9rect42.png").exists());
        assert!(!dir.path().join("page_7_boxes.png").exists());
        assert!(!dir.path().join("page_1_boxes.png").exists());
        assert!(dir.path().join("readme.txt").exists());
        assert!(dir.path().join("note.pdf").exists());
    }

    #[test]
    fn segmentation_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StubBackend::new(five_page_note());
        let pages = backend.load(&input_pdf(dir.path()), 150.0).unwrap();
        let (p, _) = processor(backend, Box::new(NullRecognizer), false);
        assert_eq!(p.segment_pages(&pages), p.segment_pages(&pages));
    }
}
