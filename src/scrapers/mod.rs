//! Content selectors for the two MLIT sources.
//!
//! Both selectors follow the same two-phase pattern:
//!
//! 1. **Indexing**: read the press feed or the interview listing page and pick
//!    candidates for the target date
//! 2. **Fetching**: download each candidate's detail page, extract its visible
//!    text, and keep it only if it really belongs to the target date
//!
//! | Source | Module | Index | Date taken from |
//! |--------|--------|-------|-----------------|
//! | Press releases | [`press`] | RSS 1.0 feed | feed timestamps |
//! | Minister interviews | [`interviews`] | HTML listing | `YYYY年M月D日` in the page |
//!
//! Detail fetches run with bounded concurrency but results keep candidate
//! order. A failed detail fetch drops that candidate only; failing to read the
//! feed or listing itself is returned to the caller.

use chrono::NaiveDate;
use chrono_tz::Tz;

pub mod feed;
pub mod interviews;
pub mod press;

/// Per-run parameters shared by the selectors.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    /// The only date whose items are kept.
    pub target_date: NaiveDate,
    /// Zone used to turn feed timestamps into dates.
    pub timezone: Tz,
    /// Maximum detail pages in flight per selector.
    pub concurrency: usize,
}
