//! MLIT press releases (報道発表資料).
//!
//! The ministry publishes an RSS 1.0 feed. Entries are dated from their feed
//! timestamps; an entry carrying none is assumed to be from the target date.

use super::RunContext;
use super::feed::{FeedEntry, parse_feed};
use crate::error::FeedError;
use crate::fetch::Fetcher;
use crate::models::{ContentItem, ContentKind};
use crate::utils::{BODY_CHAR_BUDGET, ELLIPSIS, shorten};
use chrono::NaiveDate;
use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Default press-release feed.
pub const DEFAULT_FEED_URL: &str = "https://www.mlit.go.jp/pressrelease.rdf";

/// A feed entry that passed the date filter and still needs its body.
#[derive(Debug)]
struct Candidate {
    title: String,
    link: String,
    date: NaiveDate,
}

/// Keep the entries dated `ctx.target_date`, in feed order.
fn select_candidates(entries: Vec<FeedEntry>, base: &Url, ctx: &RunContext) -> Vec<Candidate> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let date = entry.publication_date(ctx.timezone, ctx.target_date);
            if date != ctx.target_date {
                debug!(title = %entry.title, %date, "Press release outside target date");
                return None;
            }
            let Some(link) = entry.link.as_deref().and_then(|l| base.join(l).ok()) else {
                warn!(title = %entry.title, "Press release has no usable link; skipping");
                return None;
            };
            Some(Candidate {
                title: entry.title,
                link: link.to_string(),
                date,
            })
        })
        .collect()
}

/// Select the target date's press releases.
///
/// Reads the first `limit` feed entries, keeps those dated on
/// `ctx.target_date`, and fetches each detail page for its text. Entries whose
/// page cannot be fetched are logged and dropped.
///
/// # Errors
///
/// Returns [`FeedError`] if the feed itself cannot be fetched or parsed.
#[instrument(level = "info", skip(fetcher, ctx), fields(target = %ctx.target_date))]
pub async fn select_press_releases(
    fetcher: &Fetcher,
    feed_url: &str,
    ctx: &RunContext,
    limit: usize,
) -> Result<Vec<ContentItem>, FeedError> {
    let page = fetcher.fetch_text(feed_url).await?;
    let entries = parse_feed(&page.text, limit)?;
    let total = entries.len();

    let candidates = select_candidates(entries, &page.url, ctx);
    info!(
        entries = total,
        candidates = candidates.len(),
        encoding = page.encoding.name(),
        "Indexed press releases"
    );

    let items: Vec<ContentItem> = stream::iter(candidates)
        .map(|candidate| async move {
            match fetcher.fetch_text(&candidate.link).await {
                Ok(detail) => Some(ContentItem {
                    kind: ContentKind::PressRelease,
                    content: shorten(&detail.visible_text(), BODY_CHAR_BUDGET, ELLIPSIS),
                    title: candidate.title,
                    link: candidate.link,
                    date: candidate.date,
                }),
                Err(e) => {
                    warn!(url = %candidate.link, error = %e, "Press release fetch failed; skipping");
                    None
                }
            }
        })
        .buffered(ctx.concurrency.max(1))
        .filter_map(future::ready)
        .collect()
        .await;

    info!(count = items.len(), "Fetched press release contents");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::test_server::{Route, serve};
    use chrono_tz::Asia::Tokyo;
    use std::time::Duration;

    fn ctx() -> RunContext {
        RunContext {
            target_date: NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
            timezone: Tokyo,
            concurrency: 2,
        }
    }

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <item><title>当日の発表</title><link>/press/today.html</link><dc:date>2025-11-18T14:00:00+09:00</dc:date></item>
  <item><title>前日の発表</title><link>/press/old.html</link><dc:date>2025-11-17T14:00:00+09:00</dc:date></item>
  <item><title>日付なし</title><link>/press/nodate.html</link></item>
  <item><title>消えたページ</title><link>/press/gone.html</link><dc:date>2025-11-18T10:00:00+09:00</dc:date></item>
  <item><title>UTC 深夜</title><link>/press/late.html</link><pubDate>Mon, 17 Nov 2025 20:00:00 GMT</pubDate></item>
</rdf:RDF>"#;

    async fn site() -> String {
        serve(vec![
            ("/pressrelease.rdf", Route::ok("application/rdf+xml", FEED)),
            ("/press/today.html", Route::html("<h1>当日</h1><p>本文A</p>")),
            ("/press/old.html", Route::html("<p>前日</p>")),
            ("/press/nodate.html", Route::html("<p>本文B</p>")),
            ("/press/late.html", Route::html("<p>本文C</p>")),
        ])
        .await
    }

    #[tokio::test]
    async fn test_select_press_releases_filters_by_date() {
        let base = site().await;
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let items = select_press_releases(&fetcher, &format!("{base}/pressrelease.rdf"), &ctx(), 20)
            .await
            .unwrap();

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        // the 404 page is dropped, the undated entry is kept
        assert_eq!(titles, vec!["当日の発表", "日付なし", "UTC 深夜"]);
        assert!(items.iter().all(|i| i.date == ctx().target_date));
        assert!(items.iter().all(|i| i.kind == ContentKind::PressRelease));
        assert_eq!(items[0].content, "当日\n本文A");
        assert_eq!(items[1].link, format!("{base}/press/nodate.html"));
    }

    #[tokio::test]
    async fn test_limit_bounds_feed_entries() {
        let base = site().await;
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let items = select_press_releases(&fetcher, &format!("{base}/pressrelease.rdf"), &ctx(), 1)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "当日の発表");
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_an_error() {
        let server = serve(vec![]).await;
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let result = select_press_releases(&fetcher, &format!("{server}/feed"), &ctx(), 20).await;
        assert!(matches!(result, Err(FeedError::Fetch(_))));
    }
}
