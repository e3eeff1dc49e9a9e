//! Error types for fetching, summarizing, and delivering.
//!
//! Per-item failures are absorbed by the scrapers (the candidate is dropped
//! and a warning logged). Only a failure to reach a top-level feed/listing,
//! the summarizer, or a delivery channel is allowed to reach `main`.

use thiserror::Error;

/// Failure to retrieve a page over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid URL {0}")]
    InvalidUrl(String),
}

/// Failure to obtain or read the press-release feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Failure talking to an LLM provider.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("HTTP error talking to {provider}: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("no API key configured for {0}")]
    MissingKey(&'static str),
}

/// Failure delivering the digest.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error posting to Slack: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack rejected the message: {0}")]
    Slack(String),

    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build mail: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
