//! Command-line interface definitions.
//!
//! Every option can also be supplied through the environment variable named
//! in its `env` attribute; a `.env` file in the working directory is loaded
//! before parsing.

use crate::config::{Delivery, Provider};
use crate::scrapers::{interviews, press};
use chrono_tz::Tz;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Yesterday's digest (Friday's on a Monday) to Slack
/// mlit_digest
///
/// # Two business days back, summarized by Claude, sent to Slack and mail
/// mlit_digest --days-back 2 --provider claude --delivery both
///
/// # Write latest_summary.md only
/// mlit_digest --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// How many days before today to collect (weekends roll back to Friday)
    #[arg(short, long, env = "MLIT_DAYS_BACK", default_value_t = 1)]
    pub days_back: u32,

    /// IANA timezone that defines "today"
    #[arg(long, env = "MLIT_TIMEZONE", default_value = "Asia/Tokyo")]
    pub timezone: Tz,

    /// Press-release feed URL
    #[arg(long, env = "MLIT_PRESS_RSS", default_value = press::DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Minister interview listing URL
    #[arg(long, env = "MLIT_DAIJIN_LIST_URL", default_value = interviews::DEFAULT_LISTING_URL)]
    pub interview_url: String,

    /// Number of feed entries to consider
    #[arg(long, env = "MLIT_PRESS_LIMIT", default_value_t = 20)]
    pub press_limit: usize,

    /// Maximum number of interviews to collect
    #[arg(long, env = "MLIT_MAX_INTERVIEWS", default_value_t = 5)]
    pub max_interviews: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "MLIT_FETCH_TIMEOUT", default_value_t = 20)]
    pub fetch_timeout_secs: u64,

    /// Detail pages fetched in parallel per source
    #[arg(long, env = "MLIT_FETCH_CONCURRENCY", default_value_t = 4)]
    pub fetch_concurrency: usize,

    /// Where the full Markdown digest is written (overwritten each run)
    #[arg(short, long, env = "MLIT_OUTPUT", default_value = "latest_summary.md")]
    pub output: PathBuf,

    /// Summarization backend
    #[arg(long, env = "AI_PROVIDER", value_enum, ignore_case = true, default_value_t = Provider::Openai)]
    pub provider: Provider,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4.1-mini")]
    pub openai_model: String,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-3-5-sonnet-latest")]
    pub anthropic_model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-pro")]
    pub gemini_model: String,

    /// Override the provider's API base URL (proxies, compatible servers)
    #[arg(long, env = "AI_BASE_URL")]
    pub ai_base_url: Option<String>,

    /// Where to deliver the digest
    #[arg(long, env = "DELIVERY", value_enum, ignore_case = true, default_value_t = Delivery::Slack)]
    pub delivery: Delivery,

    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_bot_token: Option<String>,

    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub slack_channel_id: Option<String>,

    #[arg(long, env = "SLACK_DEBUG_CHANNEL_ID")]
    pub slack_debug_channel_id: Option<String>,

    /// Post to the debug channel instead of the normal one
    #[arg(long, env = "SLACK_DEBUG_MODE", action = ArgAction::Set, value_parser = parse_flag, default_value = "false")]
    pub slack_debug: bool,

    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    #[arg(long, env = "SMTP_PASS", hide_env_values = true)]
    pub smtp_pass: Option<String>,

    #[arg(long, env = "SMTP_TO")]
    pub smtp_to: Option<String>,

    /// Sender address; defaults to the SMTP user
    #[arg(long, env = "SMTP_FROM")]
    pub smtp_from: Option<String>,

    /// Write the digest but deliver nothing
    #[arg(long)]
    pub dry_run: bool,
}

/// Accept the usual spellings of a boolean environment flag.
fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("not a boolean: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["mlit_digest"]).unwrap();
        assert_eq!(cli.press_limit, 20);
        assert_eq!(cli.max_interviews, 5);
        assert_eq!(cli.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(cli.smtp_port, 465);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "mlit_digest",
            "-d",
            "3",
            "--provider",
            "claude",
            "--delivery",
            "both",
            "--timezone",
            "UTC",
            "--slack-debug",
            "yes",
            "-o",
            "/tmp/out.md",
        ])
        .unwrap();

        assert_eq!(cli.days_back, 3);
        assert_eq!(cli.provider, Provider::Claude);
        assert_eq!(cli.delivery, Delivery::Both);
        assert_eq!(cli.timezone, chrono_tz::UTC);
        assert!(cli.slack_debug);
        assert_eq!(cli.output, PathBuf::from("/tmp/out.md"));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("ON"), Ok(true));
        assert_eq!(parse_flag("0"), Ok(false));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_bad_timezone_is_rejected() {
        assert!(Cli::try_parse_from(["mlit_digest", "--timezone", "Mars/Olympus"]).is_err());
    }
}
