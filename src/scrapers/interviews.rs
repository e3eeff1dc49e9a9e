//! Minister press-conference transcripts (大臣会見).
//!
//! The listing page links each transcript as `daijinYYMMDD.html`. Links are
//! matched permissively (the dated filename, or anything starting with
//! `daijin`) and then confirmed against the `YYYY年M月D日` date printed in the
//! transcript itself.

use super::RunContext;
use crate::dates::parse_japanese_date;
use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::models::{ContentItem, ContentKind};
use crate::utils::{BODY_CHAR_BUDGET, ELLIPSIS, shorten};
use chrono::NaiveDate;
use futures::future;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

/// Default interview listing page.
pub const DEFAULT_LISTING_URL: &str = "https://www.mlit.go.jp/report/interview/daijin.html";

const LINK_PREFIX: &str = "daijin";

/// Whether `href` may point at the transcript for `target`.
///
/// True for any link containing `daijinYYMMDD.html` for the target date, and
/// for any relative link starting with `daijin`. The second rule over-matches
/// on purpose; the date check on the fetched page rejects the extras.
pub fn is_candidate_link(href: &str, target: NaiveDate) -> bool {
    let dated = format!("{LINK_PREFIX}{}.html", target.format("%y%m%d"));
    href.contains(&dated) || href.starts_with(LINK_PREFIX)
}

#[derive(Debug)]
struct Candidate {
    title: String,
    url: String,
}

/// Fetch one transcript and keep it if it is dated `target`.
async fn fetch_interview(fetcher: &Fetcher, candidate: Candidate, target: NaiveDate) -> Option<ContentItem> {
    debug!(url = %candidate.url, "Fetching interview detail");
    let page = match fetcher.fetch_text(&candidate.url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(url = %candidate.url, error = %e, "Interview fetch failed; skipping");
            return None;
        }
    };

    let text = page.visible_text();
    let date = parse_japanese_date(&text).unwrap_or(target);
    if date != target {
        debug!(url = %candidate.url, %date, "Interview outside target date");
        return None;
    }

    Some(ContentItem {
        kind: ContentKind::Interview,
        title: candidate.title,
        link: candidate.url,
        date,
        content: shorten(&text, BODY_CHAR_BUDGET, ELLIPSIS),
    })
}

/// Select up to `max_items` interview transcripts for `ctx.target_date`.
///
/// Candidates are taken from the listing in document order (duplicates
/// removed) and the first `max_items` that pass the date check are returned.
/// Detail pages are fetched in windows of at most `ctx.concurrency`, each no
/// larger than the number of interviews still missing, so no page is
/// requested once the cap is reached.
///
/// # Errors
///
/// Returns [`FetchError`] if the listing page cannot be fetched.
#[instrument(level = "info", skip(fetcher, ctx), fields(target = %ctx.target_date))]
pub async fn select_interviews(
    fetcher: &Fetcher,
    listing_url: &str,
    ctx: &RunContext,
    max_items: usize,
) -> Result<Vec<ContentItem>, FetchError> {
    let listing = fetcher.fetch_text(listing_url).await?;
    let target = ctx.target_date;

    let candidates: Vec<Candidate> = listing
        .links()
        .into_iter()
        .filter(|(href, _)| is_candidate_link(href, target))
        .filter_map(|(href, title)| {
            let url = listing.url.join(&href).ok()?;
            Some(Candidate {
                title,
                url: url.to_string(),
            })
        })
        .unique_by(|c| c.url.clone())
        .collect();
    info!(
        count = candidates.len(),
        encoding = listing.encoding.name(),
        "Indexed interview links"
    );
    debug!(urls = ?candidates.iter().map(|c| &c.url).collect::<Vec<_>>(), "Interview candidates");

    // Never have more pages in flight than interviews still wanted.
    let mut items: Vec<ContentItem> = Vec::new();
    let mut pending = candidates.into_iter();
    while items.len() < max_items {
        let window = ctx.concurrency.max(1).min(max_items - items.len());
        let batch: Vec<Candidate> = pending.by_ref().take(window).collect();
        if batch.is_empty() {
            break;
        }
        let fetched: Vec<ContentItem> = stream::iter(batch)
            .map(|candidate| fetch_interview(fetcher, candidate, target))
            .buffered(window)
            .filter_map(future::ready)
            .collect()
            .await;
        items.extend(fetched);
    }

    info!(count = items.len(), "Fetched interview contents");
    Ok(items)
}
