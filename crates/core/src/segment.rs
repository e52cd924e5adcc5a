use std::fmt;

use tracing::debug;

use crate::config::SegmentationConfig;
use crate::geometry::{PageSize, Rectangle, TextBlock};
use crate::merge::merge;

/// Marks the first block of the transaction table on the first page.
pub const CONTRACT_NOTE_MARKER: &str = "Contract Note No:";

/// Lower-case markers of the footer text printed just above the barcode.
pub const BARCODE_MARKERS: [&str; 3] = ["zerodha", "date:", "complaints@"];

/// Distance below the last footer marker that still belongs to the barcode area.
pub const BARCODE_MARGIN: f64 = 80.0;

/// What the segmenter knows about a page. Fixed once the page is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageContext {
    /// 0-based page index.
    pub index: usize,
    pub size: PageSize,
    /// The page carries an extractable text layer.
    pub is_digital: bool,
}

impl PageContext {
    pub fn new(index: usize, size: PageSize, is_digital: bool) -> Self {
        Self { index, size, is_digital }
    }
}

pub type Predicate = Box<dyn Fn(&PageContext) -> bool + Send + Sync>;
pub type Strategy =
    Box<dyn Fn(&[TextBlock], &PageContext, &SegmentationConfig) -> Vec<Rectangle> + Send + Sync>;

/// One row of the dispatch table.
pub struct Rule {
    name: &'static str,
    predicate: Predicate,
    strategy: Strategy,
}

impl Rule {
    pub fn new<P, S>(name: &'static str, predicate: P, strategy: S) -> Self
    where
        P: Fn(&PageContext) -> bool + Send + Sync + 'static,
        S: Fn(&[TextBlock], &PageContext, &SegmentationConfig) -> Vec<Rectangle>
            + Send
            + Sync
            + 'static,
    {
        Self { name, predicate: Box::new(predicate), strategy: Box::new(strategy) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, ctx: &PageContext) -> bool {
        (self.predicate)(ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Ordered strategy table. The first rule whose predicate accepts the page
/// decides its rectangles; pages no rule claims go through the proximity merge.
#[derive(Debug)]
pub struct Segmenter {
    rules: Vec<Rule>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::contract_note()
    }
}

impl Segmenter {
    /// A table with no rules: every page is proximity-merged.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The five-page contract note template.
    pub fn contract_note() -> Self {
        Self::empty()
            .with_rule(Rule::new("scanned-page", |ctx| !ctx.is_digital, scanned_page))
            .with_rule(Rule::new("head-table-split", |ctx| ctx.index == 0, head_table_split))
            .with_rule(Rule::new(
                "full-page",
                |ctx| matches!(ctx.index, 1 | 2 | 4),
                |blocks, _, _| full_page(blocks),
            ))
            .with_rule(Rule::new("barcode-extension", |ctx| ctx.index == 3, |blocks, _, _| {
                barcode_extension(blocks)
            }))
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Insert a rule ahead of the existing ones.
    pub fn prepend_rule(mut self, rule: Rule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Name of the strategy that will handle `ctx`.
    pub fn strategy_name(&self, ctx: &PageContext) -> &'static str {
        self.rules
            .iter()
            .find(|r| r.matches(ctx))
            .map_or("proximity-merge", Rule::name)
    }

    pub fn segment(
        &self,
        blocks: &[TextBlock],
        ctx: &PageContext,
        config: &SegmentationConfig,
    ) -> Vec<Rectangle> {
        let rects = match self.rules.iter().find(|r| r.matches(ctx)) {
            Some(rule) => (rule.strategy)(blocks, ctx, config),
            None => proximity_merge(blocks, ctx, config),
        };
        debug!(
            page = ctx.index + 1,
            strategy = self.strategy_name(ctx),
            blocks = blocks.len(),
            rectangles = rects.len(),
            "segmented page"
        );
        rects
    }
}

// ── Strategies ────────────────────────────────────────────────────────────────

/// Scanned pages get a single region: the extent of whatever blocks exist, or
/// the whole page with no text.
pub fn scanned_page(
    blocks: &[TextBlock],
    ctx: &PageContext,
    _config: &SegmentationConfig,
) -> Vec<Rectangle> {
    match Rectangle::spanning(blocks) {
        Some(r) => vec![r],
        None => vec![Rectangle::new(ctx.size.full_box(), "")],
    }
}

pub fn full_page(blocks: &[TextBlock]) -> Vec<Rectangle> {
    Rectangle::spanning(blocks).into_iter().collect()
}

/// Split the page into the header above the table and the table itself.
pub fn head_table_split(
    blocks: &[TextBlock],
    _ctx: &PageContext,
    _config: &SegmentationConfig,
) -> Vec<Rectangle> {
    let Some(split) = blocks.iter().position(|b| b.text.contains(CONTRACT_NOTE_MARKER)) else {
        return full_page(blocks);
    };
    let (head, table) = blocks.split_at(split);
    [head, table].into_iter().filter_map(Rectangle::spanning).collect()
}

/// Stretch the page rectangle down to cover the barcode printed below the footer.
pub fn barcode_extension(blocks: &[TextBlock]) -> Vec<Rectangle> {
    let Some(page) = Rectangle::spanning(blocks) else {
        return Vec::new();
    };
    let cutoff = barcode_cutoff(blocks).unwrap_or(page.bbox.y1);
    vec![Rectangle { bbox: page.bbox.with_bottom(cutoff), ..page }]
}

/// Bottom edge of the lowest footer marker plus the barcode margin.
pub fn barcode_cutoff(blocks: &[TextBlock]) -> Option<f64> {
    blocks
        .iter()
        .filter(|b| {
            let lower = b.text.to_lowercase();
            BARCODE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .map(|b| b.bbox.y1)
        .reduce(f64::max)
        .map(|bottom| bottom + BARCODE_MARGIN)
}

pub fn proximity_merge(
    blocks: &[TextBlock],
    _ctx: &PageContext,
    config: &SegmentationConfig,
) -> Vec<Rectangle> {
    merge(blocks, config.expand_px)
}
