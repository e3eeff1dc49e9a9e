//! The persisted Markdown digest.
//!
//! The file holds the summary exactly as generated (footer included) followed
//! by a source listing, and is overwritten on every run.

use crate::models::ContentItem;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// `\n\n---\n## ソース` followed by one line per item, interviews first.
pub fn sources_section(interviews: &[ContentItem], press_releases: &[ContentItem]) -> String {
    let mut section = String::from("\n\n---\n## ソース");
    for item in interviews.iter().chain(press_releases) {
        section.push_str(&format!("\n- [{}] {} : {}", item.kind, item.title, item.link));
    }
    section
}

/// Summary plus source listing.
pub fn full_document(summary: &str, interviews: &[ContentItem], press_releases: &[ContentItem]) -> String {
    format!("{summary}{}", sources_section(interviews, press_releases))
}

/// Overwrite `path` with `document`.
#[instrument(level = "info", skip(document), fields(path = %path.display()))]
pub async fn write_latest(path: &Path, document: &str) -> Result<(), Box<dyn Error>> {
    tokio::fs::write(path, document).await?;
    info!(chars = document.chars().count(), "Wrote digest");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use chrono::NaiveDate;

    fn item(kind: ContentKind, title: &str, link: &str) -> ContentItem {
        ContentItem {
            kind,
            title: title.to_string(),
            link: link.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
            content: String::new(),
        }
    }

    #[test]
    fn test_sources_section_orders_interviews_first() {
        let interviews = [item(ContentKind::Interview, "大臣会見", "https://a/daijin251118.html")];
        let press = [
            item(ContentKind::PressRelease, "道路の発表", "https://a/p1.html"),
            item(ContentKind::PressRelease, "港湾の発表", "https://a/p2.html"),
        ];
        assert_eq!(
            sources_section(&interviews, &press),
            "\n\n---\n## ソース\
             \n- [大臣会見] 大臣会見 : https://a/daijin251118.html\
             \n- [報道発表] 道路の発表 : https://a/p1.html\
             \n- [報道発表] 港湾の発表 : https://a/p2.html"
        );
    }

    #[test]
    fn test_full_document_keeps_summary_verbatim() {
        let doc = full_document("# サマリー", &[], &[]);
        assert_eq!(doc, "# サマリー\n\n---\n## ソース");
    }

    #[tokio::test]
    async fn test_write_latest_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest_summary.md");
        write_latest(&path, "first run, longer text").await.unwrap();
        write_latest(&path, "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
