//! Data models shared by the scrapers, the prompt builder, and the renderer.
//!
//! - [`ContentItem`]: one press release or minister interview selected for the
//!   target date
//! - [`ContentKind`]: which source family an item came from
//! - [`RenderedChunk`]: one length-bounded piece of chat markup

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The source family of a [`ContentItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    PressRelease,
    Interview,
}

impl ContentKind {
    /// The label used in prompts and in the source listing.
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::PressRelease => "報道発表",
            ContentKind::Interview => "大臣会見",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized unit of ingested text.
///
/// Scrapers only construct items whose `date` equals the run's target date;
/// nothing mutates an item after that.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub title: String,
    /// Absolute URL of the detail page.
    pub link: String,
    pub date: NaiveDate,
    /// Visible page text, already shortened.
    pub content: String,
}

impl ContentItem {
    /// The date in ISO-8601 form (`YYYY-MM-DD`).
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// One piece of converted chat markup, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChunk {
    pub text: String,
}

impl RenderedChunk {
    /// Length in characters, the unit chat block limits are counted in.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(ContentKind::PressRelease.label(), "報道発表");
        assert_eq!(ContentKind::Interview.to_string(), "大臣会見");
    }

    #[test]
    fn test_content_item_serialization() {
        let item = ContentItem {
            kind: ContentKind::Interview,
            title: "大臣会見".to_string(),
            link: "https://www.mlit.go.jp/report/interview/daijin251118.html".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
            content: "本文".to_string(),
        };

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"kind\":\"interview\""));
        assert!(json.contains("\"date\":\"2025-11-18\""));
        assert_eq!(item.iso_date(), "2025-11-18");
    }

    #[test]
    fn test_chunk_len_counts_chars() {
        let chunk = RenderedChunk {
            text: "国土交通省".to_string(),
        };
        assert_eq!(chunk.len(), 5);
        assert!(!chunk.is_empty());
    }
}
