//! Mail delivery over SMTP with implicit TLS.

use crate::config::SmtpConfig;
use crate::error::DeliveryError;
use chrono::NaiveDate;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{info, instrument, warn};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Mail subject for the digest sent on `today`.
///
/// # Examples
///
/// ```text
/// 国交省 大臣会見・報道発表サマリー 2025-11-18
/// ```
pub fn subject(today: NaiveDate) -> String {
    format!("国交省 大臣会見・報道発表サマリー {}", today.format("%Y-%m-%d"))
}

/// Connection and addressing settings, present only when every field is set.
struct Ready<'a> {
    host: &'a str,
    user: &'a str,
    pass: &'a str,
    from: &'a str,
    to: &'a str,
}

fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn ready(config: &SmtpConfig) -> Option<Ready<'_>> {
    Some(Ready {
        host: field(&config.host)?,
        user: field(&config.user)?,
        pass: field(&config.pass)?,
        from: field(&config.from)?,
        to: field(&config.to)?,
    })
}

/// Build the plain-text message carrying `document`.
pub fn build_message(from: &str, to: &str, today: NaiveDate, document: &str) -> Result<Message, DeliveryError> {
    let message = Message::builder()
        .from(from.parse()?)
        .to(to.parse()?)
        .subject(subject(today))
        .header(ContentType::TEXT_PLAIN)
        .body(document.to_string())?;
    Ok(message)
}

/// Send `document` by mail.
///
/// Returns `Ok(false)` without connecting when any SMTP setting is missing.
#[instrument(level = "info", skip(config, document), fields(host = config.host.as_deref().unwrap_or("")))]
pub async fn send_digest(config: &SmtpConfig, today: NaiveDate, document: &str) -> Result<bool, DeliveryError> {
    let Some(settings) = ready(config) else {
        warn!("SMTP settings incomplete; skipping mail delivery");
        return Ok(false);
    };

    let message = build_message(settings.from, settings.to, today, document)?;
    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(settings.host)?
        .port(config.port)
        .credentials(Credentials::new(settings.user.to_string(), settings.pass.to_string()))
        .timeout(Some(SMTP_TIMEOUT))
        .build();

    transport.send(message).await?;
    info!(to = %settings.to, "Sent digest by mail");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 18).unwrap()
    }

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            port: 465,
            user: Some("bot@example.com".to_string()),
            pass: Some("secret".to_string()),
            to: Some("team@example.com".to_string()),
            from: Some("bot@example.com".to_string()),
        }
    }

    #[test]
    fn test_subject_uses_iso_date() {
        assert_eq!(subject(day()), "国交省 大臣会見・報道発表サマリー 2025-11-18");
    }

    #[test]
    fn test_ready_requires_every_setting() {
        assert!(ready(&smtp()).is_some());
        let mut cfg = smtp();
        cfg.pass = Some(" ".to_string());
        assert!(ready(&cfg).is_none());
    }

    #[test]
    fn test_build_message_headers() {
        let message = build_message("bot@example.com", "team@example.com", day(), "本文").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: bot@example.com"));
        assert!(raw.contains("To: team@example.com"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let err = build_message("not an address", "team@example.com", day(), "x").unwrap_err();
        assert!(matches!(err, DeliveryError::Address(_)));
    }

    #[tokio::test]
    async fn test_incomplete_settings_skip_delivery() {
        let mut cfg = smtp();
        cfg.host = None;
        assert!(!send_digest(&cfg, day(), "doc").await.unwrap());
    }
}
