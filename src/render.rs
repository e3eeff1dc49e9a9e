//! Markdown to Slack `mrkdwn` conversion and message chunking.
//!
//! The conversion is deliberately light: bold, headings, and list bullets are
//! rewritten, fenced code blocks pass through untouched (Slack renders ```
//! itself), everything else is left alone.
//!
//! Slack caps the text of a single section block, so the converted document is
//! split on paragraph boundaries into chunks of at most `limit` characters.

use crate::models::RenderedChunk;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// Practical ceiling for the text of one Slack section block.
pub const SLACK_BLOCK_LIMIT: usize = 3000;

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(.*)$").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]+").unwrap());

const PARAGRAPH_BREAK: &str = "\n\n";

fn placeholder(index: usize) -> String {
    format!("\u{E000}CODEBLOCK{index}\u{E000}")
}

/// Pull fenced code blocks out of `md`, replacing each with a placeholder.
fn stash_code_blocks(md: &str) -> (String, Vec<String>) {
    let mut blocks = Vec::new();
    let stashed = CODE_BLOCK
        .replace_all(md, |caps: &Captures| {
            blocks.push(caps[0].to_string());
            placeholder(blocks.len() - 1)
        })
        .into_owned();
    (stashed, blocks)
}

fn restore_code_blocks(mut text: String, blocks: &[String]) -> String {
    for (i, block) in blocks.iter().enumerate() {
        text = text.replace(&placeholder(i), block);
    }
    text
}

/// Convert GitHub-style Markdown into Slack `mrkdwn`.
///
/// - `**bold**` becomes `*bold* `
/// - `#`..`######` headings become a bold line
/// - `- ` / `* ` list markers become `• `
/// - fenced code blocks are kept verbatim
pub fn markdown_to_mrkdwn(md: &str) -> String {
    let (text, blocks) = stash_code_blocks(md);

    let text = BOLD.replace_all(&text, "*$1* ");

    let text = HEADING.replace_all(&text, |caps: &Captures| {
        let mut title = caps[1].trim();
        if title.len() > 1 && title.starts_with('*') && title.ends_with('*') {
            title = &title[1..title.len() - 1];
        }
        format!("*{title}*")
    });

    let text = LIST_ITEM.replace_all(&text, "• ");

    restore_code_blocks(text.into_owned(), &blocks)
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Paragraphs (separated by a blank line) are packed greedily, joined by a
/// blank line. A paragraph that is longer than `limit` on its own is sliced
/// into pieces of exactly `limit` characters, the last one possibly shorter.
/// A `limit` of zero is treated as one.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split(PARAGRAPH_BREAK) {
        let candidate = if current.is_empty() {
            paragraph.to_string()
        } else {
            format!("{current}{PARAGRAPH_BREAK}{paragraph}")
        };

        if candidate.chars().count() <= limit {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if paragraph.chars().count() > limit {
            chunks.extend(hard_split(paragraph, limit));
        } else {
            current = paragraph.to_string();
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(limit).map(|piece| piece.iter().collect()).collect()
}

/// Convert `markdown` and split it into ordered chat blocks.
///
/// Empty blocks are dropped; every block returned is at most `limit`
/// characters (one, if `limit` is zero).
pub fn render_for_chat(markdown: &str, limit: usize) -> Vec<RenderedChunk> {
    let converted = markdown_to_mrkdwn(markdown);
    let chunks: Vec<RenderedChunk> = chunk_text(&converted, limit)
        .into_iter()
        .map(|text| RenderedChunk { text })
        .filter(|chunk| !chunk.is_empty())
        .collect();
    let longest = chunks.iter().map(RenderedChunk::len).max().unwrap_or(0);
    debug!(chunks = chunks.len(), longest, limit, "Rendered document for chat");
    chunks
}
