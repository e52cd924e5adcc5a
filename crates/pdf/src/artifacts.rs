use notebox_core::RecordGroup;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const RECTANGLES_JSON: &str = "all_rectangles_6_per_line.json";
pub const COMPOSITE_PDF: &str = "all_cropped_images.pdf";

/// `page_{page}rect{n}.png`, with `n` counted across the whole document.
pub fn crop_file_name(page: usize, n: usize) -> String {
    format!("page_{page}rect{n}.png")
}

pub fn overlay_file_name(page: usize) -> String {
    format!("page_{page}_boxes.png")
}

/// Whether `name` is something a previous run could have written.
pub fn is_artifact(name: &str) -> bool {
    if name == RECTANGLES_JSON || name == COMPOSITE_PDF {
        return true;
    }
    let Some(stem) = name.strip_suffix(".png") else {
        return false;
    };
    if stem.starts_with("temp_") {
        return true;
    }
    let Some(rest) = stem.strip_prefix("page_") else {
        return false;
    };
    if let Some(page) = rest.strip_suffix("_boxes") {
        return is_number(page);
    }
    match rest.split_once("rect") {
        Some((page, n)) => is_number(page) && is_number(n),
        None => false,
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Remove earlier run outputs from `dir`, leaving unrelated files alone.
/// Returns how many files were removed.
pub fn clean_output_dir(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_str().is_some_and(is_artifact) {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    if removed > 0 {
        debug!(dir = %dir.display(), removed, "cleared previous outputs");
    }
    Ok(removed)
}

/// Pretty-print the grouped records to [`RECTANGLES_JSON`] in `dir`.
pub fn write_groups(dir: &Path, groups: &[RecordGroup]) -> Result<PathBuf, crate::ProcessError> {
    let path = dir.join(RECTANGLES_JSON);
    fs::write(&path, serde_json::to_string_pretty(groups)?)?;
    Ok(path)
}
