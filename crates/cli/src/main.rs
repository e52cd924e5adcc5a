//! notebox - locate regions in contract-note PDFs and tag sender/receiver blocks
//!
//! ```bash
//! notebox note.pdf other.pdf --out out --no-vis
//! ```

mod report;

use anyhow::Context;
use clap::Parser;
use notebox_core::ExtractionConfig;
use notebox_ocr::recognizer_from_settings;
use notebox_pdf::{ExtractionReport, NoteProcessor, PdfiumBackend, ProcessError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Extract and group region coordinates from contract-note PDFs.
#[derive(Parser, Debug)]
#[command(name = "notebox")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more PDF files
    #[arg(required = true)]
    pdfs: Vec<PathBuf>,

    /// Output folder, created if missing (defaults to `[output] dir`)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip the `page_{n}_boxes.png` overlays
    #[arg(long)]
    no_vis: bool,

    /// Raster resolution for crops, overlays and OCR
    #[arg(long)]
    dpi: Option<f32>,

    /// Padding, in points, applied to text blocks before merging
    #[arg(long)]
    expand: Option<f64>,

    /// TOML extraction settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tesseract data directory
    #[arg(long)]
    tessdata: Option<PathBuf>,

    /// Tesseract language
    #[arg(long)]
    lang: Option<String>,

    /// Print one JSON object per input instead of the readable listing
    #[arg(long)]
    json: bool,
}

impl Args {
    /// File settings first, then whatever was given on the command line.
    fn extraction_config(&self) -> anyhow::Result<ExtractionConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::load(path)?,
            None => ExtractionConfig::default(),
        };
        if let Some(out) = &self.out {
            config.output.dir = out.clone();
        }
        if self.no_vis {
            config.segmentation.visualize = false;
        }
        if let Some(dpi) = self.dpi {
            config.segmentation.resolution_dpi = dpi;
        }
        if let Some(expand) = self.expand {
            config.segmentation.expand_px = expand;
        }
        if let Some(tessdata) = &self.tessdata {
            config.ocr.tessdata = Some(tessdata.clone());
        }
        if let Some(lang) = &self.lang {
            config.ocr.lang = lang.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[ERROR] {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// The pipeline step the batch loop drives for each input.
trait Extract {
    fn extract(&self, pdf: &Path, out_dir: &Path) -> Result<ExtractionReport, ProcessError>;
}

impl Extract for NoteProcessor {
    fn extract(&self, pdf: &Path, out_dir: &Path) -> Result<ExtractionReport, ProcessError> {
        self.process(pdf, out_dir)
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = args.extraction_config()?;
    let backend = PdfiumBackend::new().context("PDFium is required to read PDFs")?;
    let ocr = recognizer_from_settings(&config.ocr);
    let processor = NoteProcessor::new(Box::new(backend), ocr, config.segmentation.clone());

    let succeeded = process_batch(&processor, &args.pdfs, &config.output.dir, args.json);
    Ok(if succeeded == 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Runs every input in order, reporting failures per item. Returns how many succeeded.
fn process_batch(extractor: &dyn Extract, pdfs: &[PathBuf], out_dir: &Path, json: bool) -> usize {
    let mut succeeded = 0;
    for pdf in pdfs {
        if !pdf.exists() {
            eprintln!("[ERROR] PDF not found: {}", pdf.display());
            continue;
        }

        info!(pdf = %pdf.display(), "processing");
        let report = match extractor.extract(pdf, out_dir) {
            Ok(report) => report,
            Err(e) => {
                error!(pdf = %pdf.display(), error = %e, "extraction failed");
                eprintln!("[ERROR] {}: {e}", pdf.display());
                continue;
            }
        };

        if json {
            match report::json_line(pdf, &report.classification) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    error!(pdf = %pdf.display(), error = %e, "could not encode result");
                    eprintln!("[ERROR] {}: {e}", pdf.display());
                    continue;
                }
            }
        } else {
            println!("\nProcessing PDF: {}", pdf.display());
            println!("{} regions written to {}\n", report.rectangles.len(), out_dir.display());
            print!("{}", report::pretty(&report.classification));
        }
        succeeded += 1;
    }
    succeeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebox_core::Classification;
    use std::cell::RefCell;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("notebox").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_config_defaults() {
        let config = parse(&["note.pdf"]).extraction_config().unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notebox.toml");
        std::fs::write(&path, "[segmentation]\nexpand_px = 10.0\nresolution_dpi = 300.0\n").unwrap();
        let path_arg = path.to_str().unwrap();

        let config = parse(&["a.pdf", "b.pdf", "--config", path_arg, "--expand", "40", "--no-vis", "--out", "runs"])
            .extraction_config()
            .unwrap();

        assert_eq!(config.segmentation.expand_px, 40.0);
        assert_eq!(config.segmentation.resolution_dpi, 300.0);
        assert!(!config.segmentation.visualize);
        assert_eq!(config.output.dir, PathBuf::from("runs"));
    }

    #[test]
    fn at_least_one_pdf_is_required() {
        assert!(Args::try_parse_from(["notebox", "--json"]).is_err());
    }

    #[test]
    fn invalid_override_is_rejected() {
        assert!(parse(&["note.pdf", "--dpi", "0"]).extraction_config().is_err());
    }

    #[derive(Default)]
    struct RecordingExtractor {
        seen: RefCell<Vec<PathBuf>>,
    }

    impl Extract for RecordingExtractor {
        fn extract(&self, pdf: &Path, out_dir: &Path) -> Result<ExtractionReport, ProcessError> {
            self.seen.borrow_mut().push(pdf.to_path_buf());
            Ok(ExtractionReport {
                pages: 1,
                rectangles: Vec::new(),
                groups: Vec::new(),
                classification: Classification { sender: Vec::new(), receiver: Vec::new() },
                output_dir: out_dir.to_path_buf(),
            })
        }
    }

    #[test]
    fn missing_input_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.pdf");
        std::fs::write(&real, b"%PDF-1.7").unwrap();
        let pdfs = vec![dir.path().join("missing.pdf"), real.clone()];

        let extractor = RecordingExtractor::default();
        let succeeded = process_batch(&extractor, &pdfs, &dir.path().join("out"), false);

        assert_eq!(succeeded, 1);
        assert_eq!(*extractor.seen.borrow(), vec![real]);
    }

    #[test]
    fn batch_of_missing_inputs_succeeds_nowhere() {
        let dir = tempfile::tempdir().unwrap();
        let pdfs = vec![dir.path().join("a.pdf"), dir.path().join("b.pdf")];

        let extractor = RecordingExtractor::default();
        assert_eq!(process_batch(&extractor, &pdfs, dir.path(), true), 0);
        assert!(extractor.seen.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unencodable_path_is_reported_per_input() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join(OsStr::from_bytes(b"note-\xff.pdf"));
        let real = dir.path().join("real.pdf");
        if std::fs::write(&odd, b"%PDF-1.7").is_err() {
            return;
        }
        std::fs::write(&real, b"%PDF-1.7").unwrap();

        let extractor = RecordingExtractor::default();
        let succeeded = process_batch(&extractor, &[odd.clone(), real.clone()], dir.path(), true);

        assert_eq!(succeeded, 1);
        assert_eq!(*extractor.seen.borrow(), vec![odd, real]);
    }
}
