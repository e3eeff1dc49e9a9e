//! Delivery of the finished digest.
//!
//! - [`slack`]: one `chat.postMessage` carrying the rendered chunks as blocks
//! - [`email`]: one plain-text mail with the full document
//!
//! Every channel the mode selects is attempted, even after another one failed;
//! the first failure is then returned so the run ends unsuccessfully. Nothing
//! is retried.

pub mod email;
pub mod slack;

use crate::config::Config;
use crate::error::DeliveryError;
use crate::models::RenderedChunk;
use chrono::NaiveDate;
use slack::{SLACK_API_BASE, SlackClient};
use tracing::{error, info};

/// Outcome of one channel that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Skipped,
}

/// What happened on each channel; `None` for channels the mode leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Report {
    pub slack: Option<Outcome>,
    pub email: Option<Outcome>,
}

/// Deliver according to `config.delivery`.
///
/// # Arguments
///
/// * `chunks` - The document rendered for chat, used by Slack
/// * `document` - The full Markdown digest, used as the mail body and as the
///   Slack preview when there are no chunks
/// * `today` - The reference-zone date shown in the mail subject
///
/// # Returns
///
/// A [`Report`] when no selected channel failed. Otherwise the first
/// [`DeliveryError`], after every selected channel has been attempted.
pub async fn deliver(
    config: &Config,
    chunks: &[RenderedChunk],
    document: &str,
    today: NaiveDate,
) -> Result<Report, DeliveryError> {
    deliver_via(config, SLACK_API_BASE, chunks, document, today).await
}

async fn deliver_via(
    config: &Config,
    slack_api_base: &str,
    chunks: &[RenderedChunk],
    document: &str,
    today: NaiveDate,
) -> Result<Report, DeliveryError> {
    let mut first_error = None;
    let mut report = Report::default();

    if config.delivery.includes_slack() {
        let result = match SlackClient::with_api_base(config.slack.clone(), slack_api_base) {
            Ok(client) => client.post(chunks, document).await,
            Err(e) => Err(e),
        };
        report.slack = settle("slack", result, &mut first_error);
    }

    if config.delivery.includes_email() {
        let result = email::send_digest(&config.smtp, today, document).await;
        report.email = settle("email", result, &mut first_error);
    }

    info!(slack = ?report.slack, email = ?report.email, mode = ?config.delivery, "Delivery finished");
    match first_error {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

/// Map one channel's result, logging and keeping the first failure.
fn settle(
    channel: &str,
    result: Result<bool, DeliveryError>,
    first_error: &mut Option<DeliveryError>,
) -> Option<Outcome> {
    match result {
        Ok(true) => Some(Outcome::Sent),
        Ok(false) => Some(Outcome::Skipped),
        Err(e) => {
            error!(channel, error = %e, "Delivery failed");
            first_error.get_or_insert(e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::fetch::test_server::{Route, serve_recording};
    use crate::render::{SLACK_BLOCK_LIMIT, render_for_chat};
    use clap::Parser;

    fn config(delivery: &str) -> Config {
        Config::from(
            Cli::try_parse_from([
                "mlit_digest",
                "--delivery",
                delivery,
                "--slack-bot-token",
                "xoxb-test",
                "--slack-channel-id",
                "C123",
            ])
            .unwrap(),
        )
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 18).unwrap()
    }

    #[tokio::test]
    async fn test_slack_rejection_fails_delivery() {
        let (base, recorded) = serve_recording(vec![(
            "/chat.postMessage",
            Route::ok("application/json", r#"{"ok":false,"error":"invalid_auth"}"#),
        )])
        .await;
        let chunks = render_for_chat("**要点**", SLACK_BLOCK_LIMIT);

        let err = deliver_via(&config("both"), &base, &chunks, "doc", day())
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Slack(ref e) if e == "invalid_auth"));
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_and_skipped_channels_report_ok() {
        let (base, _) = serve_recording(vec![(
            "/chat.postMessage",
            Route::ok("application/json", r#"{"ok":true}"#),
        )])
        .await;
        let chunks = render_for_chat("本文", SLACK_BLOCK_LIMIT);

        let report = deliver_via(&config("both"), &base, &chunks, "doc", day())
            .await
            .unwrap();

        assert_eq!(
            report,
            Report {
                slack: Some(Outcome::Sent),
                email: Some(Outcome::Skipped),
            }
        );
    }

    #[tokio::test]
    async fn test_disabled_mode_touches_nothing() {
        let (base, recorded) = serve_recording(vec![]).await;
        let report = deliver_via(&config("none"), &base, &[], "doc", day()).await.unwrap();
        assert_eq!(report, Report::default());
        assert!(recorded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_settle_keeps_first_error() {
        let mut first = None;
        assert_eq!(settle("slack", Ok(true), &mut first), Some(Outcome::Sent));
        assert_eq!(settle("email", Ok(false), &mut first), Some(Outcome::Skipped));
        assert_eq!(
            settle("slack", Err(DeliveryError::Slack("a".to_string())), &mut first),
            None
        );
        settle("email", Err(DeliveryError::Slack("b".to_string())), &mut first);
        assert!(matches!(first, Some(DeliveryError::Slack(ref e)) if e == "a"));
    }
}
