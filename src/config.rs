//! Run configuration.
//!
//! [`Config`] is built once from the parsed [`Cli`] and handed to each
//! component; nothing below `main` reads the environment.

use crate::cli::Cli;
use chrono_tz::Tz;
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// Timeout for a summarization call; generation is much slower than a page fetch.
const SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(300);

/// Which LLM provider writes the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Openai,
    Claude,
    Gemini,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Openai => "OpenAI",
            Provider::Claude => "Anthropic",
            Provider::Gemini => "Gemini",
        }
    }
}

/// Where the finished digest goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Delivery {
    Slack,
    Email,
    Both,
    #[value(name = "none")]
    Disabled,
}

impl Delivery {
    pub fn includes_slack(self) -> bool {
        matches!(self, Delivery::Slack | Delivery::Both)
    }

    pub fn includes_email(self) -> bool {
        matches!(self, Delivery::Email | Delivery::Both)
    }
}

/// Where content comes from and how hard to fetch it.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Press-release feed.
    pub feed_url: String,
    /// Minister interview listing page.
    pub interview_url: String,
    /// Feed entries considered, counted before date filtering.
    pub press_limit: usize,
    /// Upper bound on interviews kept.
    pub max_interviews: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Detail pages in flight per selector; at least 1.
    pub concurrency: usize,
}

/// The provider's settings, already picked out of the per-provider options.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    /// Replaces the provider's public endpoint when set.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct SlackConfig {
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    pub debug_channel_id: Option<String>,
    pub debug: bool,
}

impl SlackConfig {
    /// The channel to post to: the debug channel in debug mode when one is
    /// set, the normal channel otherwise.
    pub fn target_channel(&self) -> Option<&str> {
        let channel = match (&self.debug_channel_id, self.debug) {
            (Some(debug), true) => Some(debug),
            _ => self.channel_id.as_ref(),
        };
        channel.map(String::as_str).filter(|c| !c.is_empty())
    }
}

/// SMTP settings. Mail is skipped unless host, user, pass, to and from are
/// all present.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    /// Implicit-TLS port, 465 unless overridden.
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Recipient.
    pub to: Option<String>,
    /// Sender; falls back to `user`.
    pub from: Option<String>,
}

/// Complete settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub days_back: u32,
    pub timezone: Tz,
    pub output: PathBuf,
    pub fetch: FetchConfig,
    pub summarizer: SummarizerConfig,
    pub delivery: Delivery,
    pub slack: SlackConfig,
    pub smtp: SmtpConfig,
    pub dry_run: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let (api_key, model) = match cli.provider {
            Provider::Openai => (cli.openai_api_key, cli.openai_model),
            Provider::Claude => (cli.anthropic_api_key, cli.anthropic_model),
            Provider::Gemini => (cli.gemini_api_key, cli.gemini_model),
        };

        Config {
            days_back: cli.days_back,
            timezone: cli.timezone,
            output: cli.output,
            fetch: FetchConfig {
                feed_url: cli.feed_url,
                interview_url: cli.interview_url,
                press_limit: cli.press_limit,
                max_interviews: cli.max_interviews,
                timeout: Duration::from_secs(cli.fetch_timeout_secs),
                concurrency: cli.fetch_concurrency.max(1),
            },
            summarizer: SummarizerConfig {
                provider: cli.provider,
                api_key,
                model,
                base_url: cli.ai_base_url,
                timeout: SUMMARIZER_TIMEOUT,
            },
            delivery: cli.delivery,
            slack: SlackConfig {
                bot_token: cli.slack_bot_token,
                channel_id: cli.slack_channel_id,
                debug_channel_id: cli.slack_debug_channel_id,
                debug: cli.slack_debug,
            },
            smtp: SmtpConfig {
                from: cli.smtp_from.or_else(|| cli.smtp_user.clone()),
                host: cli.smtp_host,
                port: cli.smtp_port,
                user: cli.smtp_user,
                pass: cli.smtp_pass,
                to: cli.smtp_to,
            },
            dry_run: cli.dry_run,
        }
    }
}
