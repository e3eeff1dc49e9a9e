//! # MLIT Digest
//!
//! Collects the day's press releases and minister press-conference
//! transcripts from the Ministry of Land, Infrastructure, Transport and
//! Tourism (国土交通省), has an LLM write a Japanese Markdown summary, saves it
//! with a source listing, and delivers it to Slack and/or mail.
//!
//! ## Usage
//!
//! ```sh
//! mlit_digest --provider claude --delivery both
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Date**: resolve the target business day in the reference timezone
//! 2. **Selection**: press releases (feed) and interviews (listing page), side by side
//! 3. **Summarization**: one prompt to the configured provider, footer appended
//! 4. **Output**: overwrite `latest_summary.md` with summary + sources
//! 5. **Delivery**: render to Slack mrkdwn chunks and/or send the document by mail

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dates;
mod delivery;
mod error;
mod fetch;
mod models;
mod outputs;
mod prompt;
mod render;
mod scrapers;
mod utils;

use api::{Backend, summarize_with_attribution};
use cli::Cli;
use config::Config;
use fetch::Fetcher;
use outputs::markdown;
use render::{SLACK_BLOCK_LIMIT, render_for_chat};
use scrapers::{RunContext, interviews, press};
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("mlit_digest starting up");

    let config = Config::from(Cli::parse());
    debug!(?config.output, ?config.delivery, provider = ?config.summarizer.provider, "Parsed configuration");

    // Early check: the digest must be writable before any network work
    if let Err(e) = ensure_writable_parent(&config.output).await {
        error!(
            path = %config.output.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Target date ----
    let target_date = dates::resolve_target_date(config.days_back, config.timezone);
    info!(%target_date, tz = %config.timezone, days_back = config.days_back, "Resolved target date");

    let ctx = RunContext {
        target_date,
        timezone: config.timezone,
        concurrency: config.fetch.concurrency,
    };
    let fetcher = Fetcher::new(config.fetch.timeout)?;

    // ---- Select content ----
    let (press_result, interview_result) = futures::join!(
        press::select_press_releases(&fetcher, &config.fetch.feed_url, &ctx, config.fetch.press_limit),
        interviews::select_interviews(&fetcher, &config.fetch.interview_url, &ctx, config.fetch.max_interviews),
    );
    let press_items = press_result.unwrap_or_else(|e| {
        error!(url = %config.fetch.feed_url, error = %e, "Press release selection failed");
        Vec::new()
    });
    let interview_items = interview_result.unwrap_or_else(|e| {
        error!(url = %config.fetch.interview_url, error = %e, "Interview selection failed");
        Vec::new()
    });
    info!(
        press_releases = press_items.len(),
        interviews = interview_items.len(),
        "Content selected"
    );

    if press_items.is_empty() && interview_items.is_empty() {
        info!(%target_date, "No interviews or press releases for the target date; nothing to summarize");
        return Ok(());
    }

    // ---- Summarize ----
    let prompt = prompt::build_prompt(&interview_items, &press_items, target_date);
    debug!(chars = prompt.chars().count(), preview = %utils::truncate_for_log(&prompt, 300), "Built prompt");

    let backend = Backend::from_config(&config.summarizer)?;
    let summary = summarize_with_attribution(&backend, &prompt).await?;

    // ---- Markdown output ----
    let document = markdown::full_document(&summary, &interview_items, &press_items);
    if let Err(e) = markdown::write_latest(&config.output, &document).await {
        error!(path = %config.output.display(), error = %e, "Failed writing digest");
        return Err(e);
    }

    // ---- Delivery ----
    if config.dry_run {
        info!("Dry run; skipping delivery");
    } else {
        let chunks = render_for_chat(&document, SLACK_BLOCK_LIMIT);
        info!(chunks = chunks.len(), "Rendered digest for chat");
        let today = Utc::now().with_timezone(&config.timezone).date_naive();
        // Every selected channel is attempted; a failure on any of them fails the run.
        let report = delivery::deliver(&config, &chunks, &document, today).await?;
        debug!(?report, "Delivery report");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        press_releases = press_items.len(),
        interviews = interview_items.len(),
        "Execution complete"
    );

    Ok(())
}
