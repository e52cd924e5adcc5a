use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned box in page space: origin at the top-left corner, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Grow the box outward by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            x0: self.x0 - margin,
            y0: self.y0 - margin,
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }

    /// Closed intersection test: boxes that only touch still intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Bounding box of every box in `boxes`, or `None` when empty.
    pub fn enclosing<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes.into_iter().fold(None, |acc, b| match acc {
            None => Some(*b),
            Some(a) => Some(a.union(b)),
        })
    }

    pub fn with_bottom(&self, y1: f64) -> Self {
        Self { y1, ..*self }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}, {:.2}, {:.2}]", self.x0, self.y0, self.x1, self.y1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn full_box(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }
}

/// A raw text unit reported by the page text extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: BoundingBox,
    pub text: String,
}

impl TextBlock {
    pub fn new(bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self { bbox, text: text.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A finalized page region and the text it encloses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub bbox: BoundingBox,
    pub text: String,
}

impl Rectangle {
    pub fn new(bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self { bbox, text: text.into() }
    }

    /// One rectangle spanning every block, texts trimmed and space-joined.
    /// Blank blocks still contribute their geometry.
    pub fn spanning(blocks: &[TextBlock]) -> Option<Self> {
        let bbox = BoundingBox::enclosing(blocks.iter().map(|b| &b.bbox))?;
        Some(Self { bbox, text: join_texts(blocks) })
    }
}

pub(crate) fn join_texts(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}
