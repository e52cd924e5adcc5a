use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::Rectangle;

/// Rectangles per serialized row.
pub const GROUP_SIZE: usize = 6;

/// Serialized form of a rectangle: top-left corner, size, trimmed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangleRecord {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

impl From<&Rectangle> for RectangleRecord {
    fn from(r: &Rectangle) -> Self {
        Self {
            x: round2(r.bbox.x0),
            y: round2(r.bbox.y0),
            width: round2(r.bbox.width()),
            height: round2(r.bbox.height()),
            text: r.text.trim().to_string(),
        }
    }
}

/// One row of up to six records keyed by their 1-based position ("1".."6").
pub type RecordGroup = BTreeMap<String, RectangleRecord>;

/// Chunk the page-ordered rectangles into rows of [`GROUP_SIZE`].
pub fn group_records(rects: &[Rectangle]) -> Vec<RecordGroup> {
    rects
        .chunks(GROUP_SIZE)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .map(|(i, r)| ((i + 1).to_string(), RectangleRecord::from(r)))
                .collect()
        })
        .collect()
}

/// Undo the grouping, restoring page order.
pub fn flatten_groups(groups: &[RecordGroup]) -> Vec<RectangleRecord> {
    groups
        .iter()
        .flat_map(|g| {
            let mut entries: Vec<(usize, &RectangleRecord)> = g
                .iter()
                .filter_map(|(k, v)| k.parse::<usize>().ok().map(|pos| (pos, v)))
                .collect();
            entries.sort_by_key(|(pos, _)| *pos);
            entries.into_iter().map(|(_, v)| v.clone())
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}
