//! Output generation.
//!
//! # Submodules
//!
//! - [`markdown`]: assembles the summary and source listing and writes it to
//!   the `latest_summary.md` file
//!
//! # Output Structure
//!
//! ```text
//! latest_summary.md   # summary + attribution footer + "## ソース" listing
//! ```

pub mod markdown;
