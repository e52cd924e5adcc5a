pub mod assemble;
pub mod classify;
pub mod config;
pub mod geometry;
pub mod merge;
pub mod segment;
pub mod union;

pub use assemble::{flatten_groups, group_records, RecordGroup, RectangleRecord, GROUP_SIZE};
pub use classify::{classify, party_of, Classification, ClassifiedRegion, Party};
pub use config::{ConfigError, ExtractionConfig, OcrSettings, OutputSettings, SegmentationConfig};
pub use geometry::{BoundingBox, PageSize, Rectangle, TextBlock};
pub use merge::merge;
pub use segment::{PageContext, Rule, Segmenter};
