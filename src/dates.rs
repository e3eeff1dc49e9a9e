//! Target-date resolution and publication-date parsing.
//!
//! Every run selects content for exactly one calendar day in the reference
//! timezone. Ministries do not publish on weekends, so an offset landing on
//! Saturday or Sunday rolls back to the preceding Friday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static JAPANESE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})年\s*(\d{1,2})月\s*(\d{1,2})日").unwrap());

/// Resolve the target date for a run using the current wall-clock time.
pub fn resolve_target_date(days_back: u32, tz: Tz) -> NaiveDate {
    let date = resolve_target_date_at(Utc::now().with_timezone(&tz), days_back);
    debug!(%date, days_back, %tz, "Resolved target date");
    date
}

/// Resolve the target date relative to an explicit `now`.
///
/// `now` is taken in its own timezone: the calendar date it falls on there is
/// the starting point, `days_back` days are subtracted, and a Saturday
/// (Sunday) result is moved back one (two) more days.
pub fn resolve_target_date_at<Z: TimeZone>(now: DateTime<Z>, days_back: u32) -> NaiveDate {
    let candidate = now.date_naive() - Duration::days(i64::from(days_back));
    match candidate.weekday() {
        Weekday::Sat => candidate - Duration::days(1),
        Weekday::Sun => candidate - Duration::days(2),
        _ => candidate,
    }
}

/// Parse a feed timestamp into a UTC instant.
///
/// Accepts RFC 3339 / W3CDTF (with or without seconds), RFC 2822, and a bare
/// `YYYY-MM-DD`, which is read as midnight UTC. Returns `None` for anything
/// else; callers fall through to the next field.
pub fn parse_feed_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// The calendar date a UTC instant falls on in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Find the first `YYYY年M月D日` expression in `text`.
///
/// Impossible dates (e.g. 2月30日) are treated as absent.
pub fn parse_japanese_date(text: &str) -> Option<NaiveDate> {
    let caps = JAPANESE_DATE.captures(text)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let day = caps[3].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
