//! Minimal syndication-feed reader.
//!
//! Handles RSS 1.0 (RDF, which MLIT publishes), RSS 2.0, and Atom well enough
//! to get each entry's title, link, and candidate publication timestamps. Only
//! the elements we need are looked at; everything else is skipped.

use crate::dates::{local_date, parse_feed_timestamp};
use chrono::NaiveDate;
use chrono_tz::Tz;
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};

/// One `<item>` / `<entry>` of a feed, fields as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    /// `pubDate`, `published`, or `dcterms:issued`.
    pub published: Option<String>,
    /// `updated` or `dcterms:modified`.
    pub updated: Option<String>,
    /// `dc:date`.
    pub dc_date: Option<String>,
}

impl FeedEntry {
    /// The entry's publication date in `tz`.
    ///
    /// The first of published, updated, and `dc:date` that parses wins. An
    /// entry with no usable timestamp is assumed to belong to `fallback`.
    pub fn publication_date(&self, tz: Tz, fallback: NaiveDate) -> NaiveDate {
        [&self.published, &self.updated, &self.dc_date]
            .into_iter()
            .flatten()
            .find_map(|raw| parse_feed_timestamp(raw))
            .map(|instant| local_date(instant, tz))
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
    Updated,
    DcDate,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" | b"published" | b"dcterms:issued" => Some(Field::Published),
            b"updated" | b"dcterms:modified" => Some(Field::Updated),
            b"dc:date" => Some(Field::DcDate),
            _ => None,
        }
    }
}

fn is_entry(name: &[u8]) -> bool {
    matches!(name, b"item" | b"entry")
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    let attr = e.try_get_attribute(name).ok().flatten()?;
    let raw = String::from_utf8_lossy(&attr.value).into_owned();
    Some(unescape(&raw).map(|v| v.into_owned()).unwrap_or(raw))
}

fn set_if_empty(slot: &mut Option<String>, value: String) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value);
    }
}

/// Parse up to `limit` entries from `xml`, in feed order.
pub fn parse_feed(xml: &str, limit: usize) -> Result<Vec<FeedEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    // Raw (still escaped) text of the field being read.
    let mut raw = String::new();

    while entries.len() < limit {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                if is_entry(name.as_ref()) {
                    current = Some(FeedEntry {
                        link: attribute(&e, "rdf:about"),
                        ..Default::default()
                    });
                    field = None;
                } else if let (Some(entry), None) = (current.as_mut(), field) {
                    field = Field::from_name(name.as_ref());
                    raw.clear();
                    if field == Some(Field::Link) {
                        if let Some(href) = attribute(&e, "href") {
                            entry.link = Some(href);
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    if e.name().as_ref() == b"link" {
                        let rel = attribute(&e, "rel");
                        if matches!(rel.as_deref(), None | Some("alternate")) {
                            if let Some(href) = attribute(&e, "href") {
                                entry.link = Some(href);
                            }
                        }
                    }
                }
            }
            Event::Text(e) if field.is_some() => {
                raw.push_str(&String::from_utf8_lossy(&e));
            }
            Event::GeneralRef(e) if field.is_some() => {
                raw.push('&');
                raw.push_str(&String::from_utf8_lossy(&e));
                raw.push(';');
            }
            Event::CData(e) if field.is_some() => {
                raw.push_str(&escape(String::from_utf8_lossy(&e).as_ref()));
            }
            Event::End(e) => {
                let name = e.name();
                if is_entry(name.as_ref()) {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    field = None;
                } else if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    if Field::from_name(name.as_ref()) == Some(f) {
                        let value = unescape(&raw)
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| raw.clone())
                            .trim()
                            .to_string();
                        match f {
                            Field::Title => entry.title = value,
                            // An RSS <link> body is more specific than rdf:about
                            Field::Link if !value.is_empty() => entry.link = Some(value),
                            Field::Link => {}
                            Field::Published => set_if_empty(&mut entry.published, value),
                            Field::Updated => set_if_empty(&mut entry.updated, value),
                            Field::DcDate => set_if_empty(&mut entry.dc_date, value),
                        }
                        field = None;
                        raw.clear();
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Tokyo;

    const RDF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns="http://purl.org/rss/1.0/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel rdf:about="https://www.mlit.go.jp/">
    <title>国土交通省 報道発表資料</title>
    <link>https://www.mlit.go.jp/</link>
  </channel>
  <item rdf:about="https://www.mlit.go.jp/report/press/a.html">
    <title>道路局 &amp; 都市局の発表</title>
    <link>https://www.mlit.go.jp/report/press/a.html</link>
    <dc:date>2025-11-18T15:00:00+09:00</dc:date>
  </item>
  <item rdf:about="https://www.mlit.go.jp/report/press/b.html">
    <title><![CDATA[<b>港湾</b> 局]]></title>
  </item>
</rdf:RDF>"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_rdf_items() {
        let entries = parse_feed(RDF, 20).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "道路局 & 都市局の発表");
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://www.mlit.go.jp/report/press/a.html")
        );
        assert_eq!(entries[0].dc_date.as_deref(), Some("2025-11-18T15:00:00+09:00"));
        assert_eq!(entries[1].title, "<b>港湾</b> 局");
        assert_eq!(
            entries[1].link.as_deref(),
            Some("https://www.mlit.go.jp/report/press/b.html")
        );
        assert_eq!(entries[1].dc_date, None);
    }

    #[test]
    fn test_limit_keeps_feed_order() {
        let entries = parse_feed(RDF, 1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "道路局 & 都市局の発表");
    }

    #[test]
    fn test_parse_rss2_and_atom() {
        let rss = r#"<rss><channel><title>c</title><item><title>A</title>
            <link>https://example.com/a</link><pubDate>Tue, 18 Nov 2025 01:00:00 GMT</pubDate>
            </item></channel></rss>"#;
        let entries = parse_feed(rss, 10).unwrap();
        assert_eq!(entries[0].published.as_deref(), Some("Tue, 18 Nov 2025 01:00:00 GMT"));

        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>f</title>
            <entry><title>B</title><link rel="alternate" href="https://example.com/b"/>
            <updated>2025-11-18T00:00:00Z</updated></entry></feed>"#;
        let entries = parse_feed(atom, 10).unwrap();
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/b"));
        assert_eq!(entries[0].updated.as_deref(), Some("2025-11-18T00:00:00Z"));
    }

    #[test]
    fn test_publication_date_field_priority() {
        let entry = FeedEntry {
            published: Some("2025-11-17T16:30:00Z".to_string()),
            updated: Some("2025-11-20T00:00:00Z".to_string()),
            dc_date: Some("2025-11-21".to_string()),
            ..Default::default()
        };
        // 16:30 UTC is already the next day in Tokyo
        assert_eq!(entry.publication_date(Tokyo, ymd(2000, 1, 1)), ymd(2025, 11, 18));
    }

    #[test]
    fn test_unparseable_field_falls_through() {
        let entry = FeedEntry {
            published: Some("sometime".to_string()),
            dc_date: Some("2025-11-14T09:00:00+09:00".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.publication_date(Tokyo, ymd(2000, 1, 1)), ymd(2025, 11, 14));
    }

    #[test]
    fn test_missing_dates_use_fallback() {
        let entry = FeedEntry::default();
        assert_eq!(entry.publication_date(Tokyo, ymd(2025, 11, 18)), ymd(2025, 11, 18));
    }
}
