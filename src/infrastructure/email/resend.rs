use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use serde_json::json;

use crate::{entities::email::OutboundEmail, settings::AppConfig};

#[derive(Debug, Display)]
pub enum MailerError {
    #[display("provider rejected credentials")]
    Unauthorized,

    #[display("invalid template: {_0}")]
    Template(String),

    #[display("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[display("network error: {_0}")]
    Network(String),
}

impl MailerError {
    /// True for failures caused by server-side configuration rather than a
    /// transient provider or network condition.
    pub fn is_configuration(&self) -> bool {
        matches!(self, MailerError::Unauthorized | MailerError::Template(_))
    }
}

impl From<reqwest::Error> for MailerError {
    fn from(err: reqwest::Error) -> Self {
        MailerError::Network(err.to_string())
    }
}

/// Seam to the transactional email provider. Mocked in tests.
#[mockall::automock]
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError>;
}

/// HTTP client for a Resend-style `/emails` endpoint.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.email_send_timeout_secs))
            .build()?;

        Ok(ResendMailer {
            http,
            api_key: config.resend_api_key.clone(),
            base_url: config.resend_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        let payload = json!({
            "from": email.from,
            "to": [email.to],
            "subject": email.subject,
            "text": email.text_body,
            "html": email.html_body,
        });

        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(MailerError::Unauthorized),
            422 if body.to_lowercase().contains("template") => {
                Err(MailerError::Template(truncate(&body, 200)))
            }
            code => Err(MailerError::Provider {
                status: code,
                message: truncate(&body, 200),
            }),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
