//! Slack delivery through `chat.postMessage`.

use crate::config::SlackConfig;
use crate::error::DeliveryError;
use crate::models::RenderedChunk;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Public Slack Web API.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Maximum length of the notification preview text.
pub const FALLBACK_CHAR_LIMIT: usize = 2000;

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Preview text for notifications: the first chunk, or the raw document when
/// there are no chunks, cut to [`FALLBACK_CHAR_LIMIT`] characters.
pub fn fallback_text(chunks: &[RenderedChunk], document: &str) -> String {
    let source = chunks.first().map_or(document, |c| c.text.as_str());
    source.chars().take(FALLBACK_CHAR_LIMIT).collect()
}

/// One `section` block per chunk, in order.
pub fn blocks(chunks: &[RenderedChunk]) -> Vec<Value> {
    chunks
        .iter()
        .map(|chunk| {
            json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": chunk.text },
            })
        })
        .collect()
}

/// Posts digests with a bot token.
///
/// Built per run from [`SlackConfig`]; the channel is chosen by
/// [`SlackConfig::target_channel`] at post time.
pub struct SlackClient {
    client: Client,
    api_base: String,
    config: SlackConfig,
}

impl SlackClient {
    /// Client for a Slack-compatible API at `api_base` (no trailing `/`
    /// needed).
    pub fn with_api_base(config: SlackConfig, api_base: &str) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Post the digest as one message.
    ///
    /// Returns `Ok(false)` without contacting Slack when the token or channel
    /// is not configured.
    ///
    /// # Errors
    ///
    /// [`DeliveryError::Http`] on transport failure, [`DeliveryError::Slack`]
    /// when the API answers `ok: false`.
    #[instrument(level = "info", skip_all, fields(chunks = chunks.len()))]
    pub async fn post(&self, chunks: &[RenderedChunk], document: &str) -> Result<bool, DeliveryError> {
        let token = self.config.bot_token.as_deref().filter(|t| !t.is_empty());
        let (Some(token), Some(channel)) = (token, self.config.target_channel()) else {
            warn!("Slack token or channel not configured; skipping Slack delivery");
            return Ok(false);
        };

        let payload = json!({
            "channel": channel,
            "text": fallback_text(chunks, document),
            "blocks": blocks(chunks),
        });

        let resp: PostMessageResponse = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !resp.ok {
            return Err(DeliveryError::Slack(
                resp.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        info!(%channel, debug = self.config.debug, "Posted digest to Slack");
        Ok(true)
    }
}
