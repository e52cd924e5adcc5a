pub mod artifacts;
pub mod backend;
pub mod error;
pub mod page;
pub mod processor;
pub mod visualize;

pub use artifacts::{COMPOSITE_PDF, RECTANGLES_JSON};
pub use backend::{PdfBackend, PdfiumBackend};
pub use error::{PdfError, ProcessError};
pub use page::{LoadedPage, PageRaster};
pub use processor::{ExtractionReport, NoteProcessor};
pub use visualize::Overlay;
