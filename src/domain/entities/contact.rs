use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    constants::{
        COMPANY_MAX_LEN, EMAIL_MAX_LEN, MESSAGE_MAX_LEN, MESSAGE_MIN_LEN, NAME_MAX_LEN,
        NAME_MIN_LEN,
    },
    entities::email::EmailResults,
    errors::AppError,
};

/// Basic `local@domain.tld` shape; stricter RFC parsing is the provider's job.
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex is valid"));

/// The contact form exactly as deserialized from the request body. Every
/// field is optional so that a missing required field is reported by
/// `validate`, not as a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct RawContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
}

impl RawContactForm {
    /// Checks every field constraint against the trimmed values and returns
    /// the first violation. Required-missing is reported before length, and
    /// fields are checked in form order. Does not mutate or truncate.
    pub fn validate(&self) -> Result<(), AppError> {
        let name = self.name.as_deref().map(str::trim).unwrap_or("");
        if name.is_empty() {
            return Err(AppError::validation("name", "Name is required"));
        }
        if name.chars().count() < NAME_MIN_LEN {
            return Err(AppError::validation(
                "name",
                format!("Name must be at least {} characters", NAME_MIN_LEN),
            ));
        }

        let email = self.email.as_deref().map(str::trim).unwrap_or("");
        if email.is_empty() {
            return Err(AppError::validation("email", "Email is required"));
        }
        if !EMAIL_REGEX.is_match(email) {
            return Err(AppError::validation("email", "Email must be a valid email"));
        }

        let message = self.message.as_deref().map(str::trim).unwrap_or("");
        if message.is_empty() {
            return Err(AppError::validation("message", "Message is required"));
        }
        if message.chars().count() < MESSAGE_MIN_LEN {
            return Err(AppError::validation(
                "message",
                format!("Message must be at least {} characters", MESSAGE_MIN_LEN),
            ));
        }

        Ok(())
    }

    /// Produces the typed submission: trims every field, lower-cases the
    /// email, and silently truncates to the maximum lengths. Only meaningful
    /// after `validate` has passed.
    pub fn sanitize(self) -> ContactSubmission {
        let name = truncate_chars(self.name.as_deref().unwrap_or("").trim(), NAME_MAX_LEN);
        let email = truncate_chars(
            &self.email.as_deref().unwrap_or("").trim().to_lowercase(),
            EMAIL_MAX_LEN,
        );
        let company = truncate_chars(self.company.as_deref().unwrap_or("").trim(), COMPANY_MAX_LEN);
        let message = truncate_chars(self.message.as_deref().unwrap_or("").trim(), MESSAGE_MAX_LEN);

        ContactSubmission {
            name,
            email,
            company,
            message,
        }
    }
}

/// A validated and sanitized contact submission. Nothing past the form
/// boundary operates on the raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub company: String,
    pub message: String,
}

/// Transport-layer metadata for one submission. Used for rate-limit keying
/// and log correlation only; never persisted.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(client_ip: String, user_agent: Option<String>, referer: Option<String>) -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
            client_ip,
            user_agent,
            referer,
            received_at: Utc::now(),
        }
    }
}

/// Rate-limit status accompanying a successful submission; rendered as
/// response headers, not into the body.
#[derive(Debug, Clone, Copy)]
pub struct RateStatus {
    pub limit: u32,
    pub remaining: u32,
    /// Window reset as epoch milliseconds.
    pub reset_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub success: bool,
    pub message: String,
    pub email_results: EmailResults,
    #[serde(skip)]
    pub rate: RateStatus,
}

/// Truncates to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
