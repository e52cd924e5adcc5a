//! Console rendering of extraction results.

use notebox_core::{Classification, ClassifiedRegion};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

#[derive(Serialize)]
struct JsonReport<'a> {
    pdf: &'a Path,
    sender_blocks: &'a [ClassifiedRegion],
    receiver_blocks: &'a [ClassifiedRegion],
}

/// One JSON object per input, on a single line.
pub fn json_line(pdf: &Path, classification: &Classification) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport {
        pdf,
        sender_blocks: &classification.sender,
        receiver_blocks: &classification.receiver,
    })
}

pub fn pretty(classification: &Classification) -> String {
    let mut out = String::new();
    section(&mut out, "Sender blocks found:", &classification.sender);
    out.push('\n');
    section(&mut out, "Receiver blocks found:", &classification.receiver);
    out
}

fn section(out: &mut String, title: &str, regions: &[ClassifiedRegion]) {
    let _ = writeln!(out, "{title}");
    if regions.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (position, r) in regions {
        let _ = writeln!(
            out,
            "  [{position}] x={:.2} y={:.2} w={:.2} h={:.2}  {:?}",
            r.x, r.y, r.width, r.height, r.text
        );
    }
}
