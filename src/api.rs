//! LLM summarization backends.
//!
//! Each provider sits behind the [`Summarizer`] trait and is chosen by
//! configuration, not by branching at the call site:
//!
//! - [`OpenAiSummarizer`]: OpenAI Responses API
//! - [`AnthropicSummarizer`]: Anthropic Messages API
//! - [`GeminiSummarizer`]: Google `generateContent`
//!
//! [`Backend`] wraps whichever one was configured.

use crate::config::{Provider, SummarizerConfig};
use crate::error::SummarizeError;
use crate::utils::truncate_for_log;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 4000;

/// Something that turns a prompt into a Markdown summary.
#[allow(async_fn_in_trait)]
pub trait Summarizer {
    /// Human-readable backend name used in the attribution footer,
    /// e.g. `OpenAI (gpt-4.1-mini)`.
    fn label(&self) -> String;

    /// Send `prompt` and return the model's Markdown answer.
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError>;
}

/// POST a JSON request and decode the JSON answer, mapping failures to
/// [`SummarizeError`].
async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, SummarizeError> {
    let http = |source| SummarizeError::Http { provider, source };
    let resp = request.send().await.map_err(http)?;
    let status = resp.status();
    let body = resp.text().await.map_err(http)?;

    if !status.is_success() {
        return Err(SummarizeError::Api {
            provider,
            message: format!("HTTP {status}: {}", truncate_for_log(&body, 500)),
        });
    }

    serde_json::from_str(&body).map_err(|e| SummarizeError::Api {
        provider,
        message: format!("unexpected response ({e}): {}", truncate_for_log(&body, 300)),
    })
}

fn empty_answer(provider: &'static str) -> SummarizeError {
    SummarizeError::Api {
        provider,
        message: "response contained no text".to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// OpenAI Responses API client.
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OpenAiOutput>,
}

#[derive(Debug, Deserialize)]
struct OpenAiOutput {
    #[serde(default)]
    content: Vec<TextPart>,
}

impl OpenAiResponse {
    fn into_text(self) -> Option<String> {
        if let Some(text) = self.output_text.filter(|t| !t.is_empty()) {
            return Some(text);
        }
        let text: String = self
            .output
            .into_iter()
            .flat_map(|o| o.content)
            .filter(|part| part.kind.as_deref() == Some("output_text"))
            .filter_map(|part| part.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

impl Summarizer for OpenAiSummarizer {
    fn label(&self) -> String {
        format!("OpenAI ({})", self.model)
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let request = self
            .client
            .post(format!("{}/v1/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": prompt }));
        let resp: OpenAiResponse = send_json("OpenAI", request).await?;
        resp.into_text().ok_or_else(|| empty_answer("OpenAI"))
    }
}

/// Anthropic Messages API client.
#[derive(Debug, Clone)]
pub struct AnthropicSummarizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<TextPart>,
}

impl Summarizer for AnthropicSummarizer {
    fn label(&self) -> String {
        format!("Claude ({})", self.model)
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.model,
                "max_tokens": ANTHROPIC_MAX_TOKENS,
                "messages": [{ "role": "user", "content": prompt }],
            }));
        let resp: AnthropicResponse = send_json("Anthropic", request).await?;
        let text: String = resp
            .content
            .into_iter()
            .filter(|part| part.kind.as_deref() == Some("text"))
            .filter_map(|part| part.text)
            .collect();
        (!text.is_empty())
            .then_some(text)
            .ok_or_else(|| empty_answer("Anthropic"))
    }
}

/// Google Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

impl Summarizer for GeminiSummarizer {
    fn label(&self) -> String {
        format!("Gemini ({})", self.model)
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let request = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }));
        let resp: GeminiResponse = send_json("Gemini", request).await?;
        let text: String = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        (!text.is_empty())
            .then_some(text)
            .ok_or_else(|| empty_answer("Gemini"))
    }
}

/// The configured summarization backend.
#[derive(Debug, Clone)]
pub enum Backend {
    OpenAi(OpenAiSummarizer),
    Anthropic(AnthropicSummarizer),
    Gemini(GeminiSummarizer),
}

impl Backend {
    /// Build the backend selected by `config.provider`.
    ///
    /// # Errors
    ///
    /// [`SummarizeError::MissingKey`] when the provider's API key is unset.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        let provider_name = config.provider.display_name();
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SummarizeError::MissingKey(provider_name))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| SummarizeError::Http {
                provider: provider_name,
                source,
            })?;
        let model = config.model.clone();
        let base_url = |default: &str| {
            config
                .base_url
                .clone()
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        Ok(match config.provider {
            Provider::Openai => Backend::OpenAi(OpenAiSummarizer {
                client,
                api_key,
                model,
                base_url: base_url(OPENAI_BASE_URL),
            }),
            Provider::Claude => Backend::Anthropic(AnthropicSummarizer {
                client,
                api_key,
                model,
                base_url: base_url(ANTHROPIC_BASE_URL),
            }),
            Provider::Gemini => Backend::Gemini(GeminiSummarizer {
                client,
                api_key,
                model,
                base_url: base_url(GEMINI_BASE_URL),
            }),
        })
    }
}

impl Summarizer for Backend {
    fn label(&self) -> String {
        match self {
            Backend::OpenAi(s) => s.label(),
            Backend::Anthropic(s) => s.label(),
            Backend::Gemini(s) => s.label(),
        }
    }

    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        match self {
            Backend::OpenAi(s) => s.summarize(prompt).await,
            Backend::Anthropic(s) => s.summarize(prompt).await,
            Backend::Gemini(s) => s.summarize(prompt).await,
        }
    }
}

/// The attribution line appended to every summary.
pub fn attribution_footer(label: &str) -> String {
    format!("\n\n---\n_この要約は **{label}** を用いて自動生成されました。_")
}

/// Summarize `prompt` and append the attribution footer.
#[instrument(level = "info", skip_all)]
pub async fn summarize_with_attribution<S: Summarizer>(
    summarizer: &S,
    prompt: &str,
) -> Result<String, SummarizeError> {
    let t0 = Instant::now();
    let label = summarizer.label();
    let res = summarizer.summarize(prompt).await;
    let dt: Duration = t0.elapsed();

    match res {
        Ok(markdown) => {
            info!(
                backend = %label,
                elapsed_ms = dt.as_millis() as u64,
                chars = markdown.chars().count(),
                "Summary generated"
            );
            if markdown.trim().is_empty() {
                warn!(backend = %label, "Summary is blank");
            }
            Ok(format!("{}{}", markdown.trim(), attribution_footer(&label)))
        }
        Err(e) => {
            error!(backend = %label, elapsed_ms = dt.as_millis() as u64, error = %e, "Summarization failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::test_server::{Route, serve};

    #[derive(Debug)]
    struct Canned(&'static str);

    impl Summarizer for Canned {
        fn label(&self) -> String {
            "Test (canned)".to_string()
        }

        async fn summarize(&self, _prompt: &str) -> Result<String, SummarizeError> {
            Ok(self.0.to_string())
        }
    }

    fn config(provider: Provider, base_url: Option<String>) -> SummarizerConfig {
        SummarizerConfig {
            provider,
            api_key: Some("sk-test".to_string()),
            model: "test-model".to_string(),
            base_url,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_footer_is_appended() {
        let out = summarize_with_attribution(&Canned("  # 要約\n本文  \n"), "prompt")
            .await
            .unwrap();
        assert_eq!(
            out,
            "# 要約\n本文\n\n---\n_この要約は **Test (canned)** を用いて自動生成されました。_"
        );
    }

    #[test]
    fn test_openai_output_text_extraction() {
        let resp: OpenAiResponse = serde_json::from_str(
            r##"{"output":[{"type":"reasoning","content":[]},
                {"type":"message","content":[{"type":"output_text","text":"# 要約"},{"type":"output_text","text":"\n本文"}]}]}"##,
        )
        .unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("# 要約\n本文"));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let mut cfg = config(Provider::Claude, None);
        cfg.api_key = Some("  ".to_string());
        assert!(matches!(
            Backend::from_config(&cfg),
            Err(SummarizeError::MissingKey("Anthropic"))
        ));
    }

    #[test]
    fn test_backend_labels() {
        let backend = Backend::from_config(&config(Provider::Gemini, None)).unwrap();
        assert_eq!(backend.label(), "Gemini (test-model)");
        let backend = Backend::from_config(&config(Provider::Openai, None)).unwrap();
        assert_eq!(backend.label(), "OpenAI (test-model)");
    }

    #[tokio::test]
    async fn test_anthropic_round_trip() {
        let base = serve(vec![(
            "/v1/messages",
            Route::ok(
                "application/json",
                r###"{"content":[{"type":"text","text":"## 大臣会見の要点"}]}"###,
            ),
        )])
        .await;
        let backend = Backend::from_config(&config(Provider::Claude, Some(base))).unwrap();
        assert_eq!(backend.summarize("prompt").await.unwrap(), "## 大臣会見の要点");
    }

    #[tokio::test]
    async fn test_gemini_round_trip() {
        let base = serve(vec![(
            "/v1beta/models/test-model:generateContent",
            Route::ok(
                "application/json",
                r#"{"candidates":[{"content":{"parts":[{"text":"要約"},{"text":"です"}]}}]}"#,
            ),
        )])
        .await;
        let backend = Backend::from_config(&config(Provider::Gemini, Some(base))).unwrap();
        assert_eq!(backend.summarize("prompt").await.unwrap(), "要約です");
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let base = serve(vec![]).await;
        let backend = Backend::from_config(&config(Provider::Openai, Some(base))).unwrap();
        let err = backend.summarize("prompt").await.unwrap_err();
        assert!(matches!(err, SummarizeError::Api { provider: "OpenAI", .. }));
    }
}
