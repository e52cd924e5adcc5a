pub mod fallback;
pub mod preprocess;
pub mod recognizer;

pub use fallback::{RegionRasterizer, ScanFallback};
pub use preprocess::{encode_png, prepare_for_ocr, PreprocessError};
pub use recognizer::{
    recognizer_from_settings, FailingRecognizer, MockRecognizer, NullRecognizer, OcrBackend,
    OcrError,
};
