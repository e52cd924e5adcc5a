use tracing::debug;

use crate::geometry::{BoundingBox, Rectangle, TextBlock};
use crate::union::connected_regions;

/// Fuse nearby text blocks into paragraph-level rectangles.
///
/// Blank blocks are dropped. Each remaining box is padded by `expand` before
/// the union is taken, which bridges the small gaps between fragments of one
/// logical block. A region's text collects every original block whose
/// unpadded box touches the region, in block order.
pub fn merge(blocks: &[TextBlock], expand: f64) -> Vec<Rectangle> {
    let kept: Vec<(BoundingBox, &str)> = blocks
        .iter()
        .filter(|b| !b.is_blank())
        .map(|b| (b.bbox, b.text.trim()))
        .collect();
    if kept.is_empty() {
        return Vec::new();
    }

    let padded: Vec<BoundingBox> = kept.iter().map(|(b, _)| b.expand(expand)).collect();
    let regions = connected_regions(&padded);
    debug!(blocks = kept.len(), regions = regions.len(), expand, "merged text blocks");

    regions
        .iter()
        .map(|region| {
            let text = kept
                .iter()
                .filter(|(bbox, _)| region.members.iter().any(|&m| padded[m].intersects(bbox)))
                .map(|(_, text)| *text)
                .collect::<Vec<_>>()
                .join(" ");
            Rectangle::new(region.bounds, text)
        })
        .collect()
}
