//! String and file-system helpers shared across the pipeline.
//!
//! - Body shortening for prompt excerpts
//! - Truncation for log previews
//! - Output-location validation

use itertools::Itertools;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Character budget for one item's body text.
pub const BODY_CHAR_BUDGET: usize = 8000;

/// Appended where a body was cut.
pub const ELLIPSIS: &str = "...";

/// Normalize whitespace and cut `text` to at most `width` characters.
///
/// Runs of whitespace inside a line collapse to one space, blank lines are
/// dropped, and line breaks survive. When the text is too long it is cut at
/// the last whitespace that fits and `placeholder` is appended, so the result
/// including the placeholder is never longer than `width`. Text without a
/// usable break (CJK prose) is cut at a character boundary instead.
pub fn shorten(text: &str, width: usize, placeholder: &str) -> String {
    let normalized = text
        .lines()
        .map(|line| line.split_whitespace().join(" "))
        .filter(|line| !line.is_empty())
        .join("\n");

    if normalized.chars().count() <= width {
        return normalized;
    }

    let budget = width.saturating_sub(placeholder.chars().count());
    let cut = normalized
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(normalized.len());
    let head = &normalized[..cut];

    let on_boundary = normalized[cut..]
        .chars()
        .next()
        .is_some_and(char::is_whitespace);
    let kept = if on_boundary {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(i) if head[..i].chars().count() >= budget / 2 => &head[..i],
            _ => head,
        }
    };

    format!("{}{}", kept.trim_end(), placeholder)
}

/// Truncate a string for logging purposes.
///
/// Long strings keep their first `max` characters followed by
/// `"…(+N bytes)"`.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((i, _)) => format!("{}…(+{} bytes)", &s[..i], s.len() - i),
    }
}

/// Make sure the directory that will hold `file` exists and is writable.
///
/// Creates missing directories, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe = dir.join("..__probe_write__");
    fs::write(&probe, b"").await?;
    let _ = fs::remove_file(&probe).await;
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}
