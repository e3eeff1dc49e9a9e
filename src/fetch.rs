//! HTTP fetching with character-encoding recovery.
//!
//! Government pages do not reliably declare their charset, and legacy
//! Shift_JIS / EUC-JP pages sit next to UTF-8 ones. The charset is chosen by
//! walking [`DECODE_CHAIN`] in order:
//!
//! 1. `charset=` parameter of the `Content-Type` header
//! 2. a guess made from the raw bytes (BOM, in-document declaration, then a
//!    trial decode against the usual Japanese encodings)
//! 3. UTF-8
//!
//! Decoding is always lossy: invalid sequences become U+FFFD, so a fetched
//! body never fails to turn into text.

use crate::error::FetchError;
use encoding_rs::{EUC_JP, Encoding, ISO_2022_JP, SHIFT_JIS, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Node};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

static HEADER_CHARSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)charset=([^\s;]+)").unwrap());

static DOCUMENT_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:<meta[^>]+charset\s*=\s*|<\?xml[^>]+encoding\s*=\s*)["']?([A-Za-z0-9_\-:.]+)"#)
        .unwrap()
});

/// Bytes examined when looking for an in-document charset declaration.
const SNIFF_WINDOW: usize = 2048;

/// Elements whose text never renders.
const INVISIBLE: [&str; 4] = ["script", "style", "noscript", "template"];

/// One way of choosing the charset for a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    HeaderCharset,
    Detected,
    Utf8Default,
}

/// The order in which [`DecodeStrategy`]s are consulted.
pub const DECODE_CHAIN: [DecodeStrategy; 3] = [
    DecodeStrategy::HeaderCharset,
    DecodeStrategy::Detected,
    DecodeStrategy::Utf8Default,
];

impl DecodeStrategy {
    fn choose(self, content_type: Option<&str>, bytes: &[u8]) -> Option<&'static Encoding> {
        match self {
            DecodeStrategy::HeaderCharset => content_type
                .and_then(charset_from_content_type)
                .and_then(|label| Encoding::for_label(label.as_bytes())),
            DecodeStrategy::Detected => detect_encoding(bytes),
            DecodeStrategy::Utf8Default => Some(UTF_8),
        }
    }
}

/// Extract the `charset` parameter of a `Content-Type` value, without quotes.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    let caps = HEADER_CHARSET.captures(content_type)?;
    let label = caps[1].trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Guess the encoding of a body from its bytes alone.
pub fn detect_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(encoding);
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_WINDOW)]);
    if let Some(encoding) = DOCUMENT_CHARSET
        .captures(&head)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
    {
        return Some(encoding);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return Some(UTF_8);
    }

    // Legacy Japanese encodings, tried in order; the first clean decode wins.
    [SHIFT_JIS, EUC_JP, ISO_2022_JP].into_iter().find(|encoding| {
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .is_some()
    })
}

/// Decode a response body using the first strategy in [`DECODE_CHAIN`] that
/// yields an encoding.
pub fn decode_body(content_type: Option<&str>, bytes: &[u8]) -> (String, &'static Encoding) {
    let (strategy, encoding) = DECODE_CHAIN
        .into_iter()
        .find_map(|strategy| strategy.choose(content_type, bytes).map(|e| (strategy, e)))
        .unwrap_or((DecodeStrategy::Utf8Default, UTF_8));

    let (text, had_errors) = encoding.decode_without_bom_handling(strip_bom(bytes, encoding));
    debug!(
        ?strategy,
        encoding = encoding.name(),
        had_errors,
        "Decoded response body"
    );
    (text.into_owned(), encoding)
}

fn strip_bom<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> &'a [u8] {
    match Encoding::for_bom(bytes) {
        Some((bom_encoding, len)) if bom_encoding == encoding => &bytes[len..],
        _ => bytes,
    }
}

/// A fetched and decoded page.
#[derive(Debug, Clone)]
pub struct Page {
    /// The final URL after redirects; relative links resolve against it.
    pub url: Url,
    /// Body decoded to UTF-8.
    pub text: String,
    /// The encoding the decode chain settled on.
    pub encoding: &'static Encoding,
}

impl Page {
    /// Parse the page as an HTML document.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.text)
    }

    /// Visible text of the page, one text node per line.
    pub fn visible_text(&self) -> String {
        visible_text(&self.document())
    }

    /// Every `<a href>` in document order, as `(href, anchor text)`.
    pub fn links(&self) -> Vec<(String, String)> {
        links(&self.document())
    }
}

/// All rendered text nodes, each trimmed, blank ones dropped, joined by `\n`.
pub fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

/// Every anchor with an `href`, in document order.
pub fn links(document: &Html) -> Vec<(String, String)> {
    let selector = scraper::Selector::parse("a[href]").unwrap();
    document
        .select(&selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let title = a.text().collect::<String>().trim().to_string();
            Some((href.to_string(), title))
        })
        .collect()
}

/// HTTP client that returns decoded pages.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Applied to each request as a whole (connect, headers and body)
    ///
    /// # Returns
    ///
    /// The fetcher, or [`FetchError::Transport`] if the HTTP client cannot be
    /// initialized (for example, no TLS backend).
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Transport {
                url: String::new(),
                source,
            })?;
        Ok(Self { client, timeout })
    }

    /// GET `url` and decode the body.
    ///
    /// Transport failures, timeouts, and non-success statuses are
    /// [`FetchError`]s; decoding never fails.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_text(&self, url: &str) -> Result<Page, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let final_url = resp.url().clone();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(transport)?;

        let (text, encoding) = decode_body(content_type.as_deref(), &bytes);
        debug!(bytes = bytes.len(), chars = text.chars().count(), "Fetched page");
        Ok(Page {
            url: final_url,
            text,
            encoding,
        })
    }
}
