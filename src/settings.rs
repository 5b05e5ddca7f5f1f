use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::{env, fmt, str::FromStr};
use url::Url;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// API key for the transactional email provider. Empty means submissions
    /// are refused with 503 until it is configured.
    #[serde(default)]
    pub resend_api_key: String,

    #[serde(default = "default_resend_base_url")]
    pub resend_base_url: String,

    /// Address the owner notification is delivered to.
    #[serde(default)]
    pub contact_to: String,

    /// Sender address for both outgoing messages. A provider onboarding
    /// address is substituted when unset.
    #[serde(default)]
    pub contact_from: String,

    /// Subject template for the owner notification; `{name}` is replaced with
    /// the sender's name. Built-in subject is used when unset.
    #[serde(default)]
    pub contact_template: Option<String>,

    /// Subject template for the auto-reply. Built-in subject when unset.
    #[serde(default)]
    pub auto_reply_template: Option<String>,

    #[serde(default = "default_site_url")]
    pub site_url: Url,

    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: i64,

    #[serde(default = "default_email_send_timeout_secs")]
    pub email_send_timeout_secs: u64,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Contact-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}
fn default_site_url() -> Url {
    Url::parse("https://example.com").expect("static URL is valid")
}
fn default_rate_limit_max_requests() -> u32 {
    3
}
fn default_rate_limit_window_ms() -> i64 {
    300_000
}
fn default_email_send_timeout_secs() -> u64 {
    8
}

pub const DEFAULT_CONTACT_FROM: &str = "Portfolio Contact <onboarding@resend.dev>";

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            cors_allowed_origins: default_cors_origins(),
            resend_api_key: String::new(),
            resend_base_url: default_resend_base_url(),
            contact_to: String::new(),
            contact_from: String::new(),
            contact_template: None,
            auto_reply_template: None,
            site_url: default_site_url(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            email_send_timeout_secs: default_email_send_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!("config/{}", env_name.to_string().to_lowercase()))
                    .required(false),
            )
            .add_source(Environment::with_prefix("APP").ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    /// Startup-time validation. Deliberately does not require the email
    /// provider settings: the server still boots without them and answers
    /// submissions with 503 until they are configured.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push("host cannot be empty".to_string());
        }
        if self.rate_limit_max_requests == 0 {
            errors.push("rate_limit_max_requests must be at least 1".to_string());
        }
        if self.rate_limit_window_ms <= 0 {
            errors.push("rate_limit_window_ms must be positive".to_string());
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Sender address with the default substituted when unset.
    pub fn sender_address(&self) -> String {
        let from = self.contact_from.trim();
        if from.is_empty() {
            DEFAULT_CONTACT_FROM.to_string()
        } else {
            from.to_string()
        }
    }

    /// Checks the email provider configuration. Consulted at the start of
    /// every submission and served directly by the health-check route.
    pub fn email_report(&self) -> EmailConfigReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        let has_api_key = !self.resend_api_key.trim().is_empty();
        if !has_api_key {
            issues.push("email provider API key is not set".to_string());
        }

        if self.contact_to.trim().is_empty() {
            issues.push("contact recipient address is not set".to_string());
        }

        if self.contact_from.trim().is_empty() {
            warnings.push(format!(
                "no sender address configured, using {}",
                DEFAULT_CONTACT_FROM
            ));
        }

        let has_contact_template = self.contact_template.is_some();
        if !has_contact_template {
            warnings.push("no contact subject template configured, using built-in".to_string());
        }

        let has_auto_reply_template = self.auto_reply_template.is_some();
        if !has_auto_reply_template {
            warnings.push("no auto-reply subject template configured, using built-in".to_string());
        }

        EmailConfigReport {
            is_valid: issues.is_empty(),
            issues,
            warnings,
            has_api_key,
            has_contact_template,
            has_auto_reply_template,
        }
    }
}

/// Result of validating the email provider configuration. Issues block
/// submissions; warnings mean a default was substituted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfigReport {
    pub is_valid: bool,

    /// Internal detail, logged server-side but never sent to callers.
    #[serde(skip)]
    pub issues: Vec<String>,

    pub warnings: Vec<String>,
    pub has_api_key: bool,
    pub has_contact_template: bool,
    pub has_auto_reply_template: bool,
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("resend_api_key", &self.resend_api_key.redact())
            .field("resend_base_url", &self.resend_base_url)
            .field("contact_to", &self.contact_to)
            .field("contact_from", &self.contact_from)
            .field("contact_template", &self.contact_template)
            .field("auto_reply_template", &self.auto_reply_template)
            .field("site_url", &self.site_url.as_str())
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_ms", &self.rate_limit_window_ms)
            .field("email_send_timeout_secs", &self.email_send_timeout_secs)
            .finish()
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        AppConfig {
            resend_api_key: "re_test_key".to_string(),
            contact_to: "owner@example.com".to_string(),
            contact_from: "Site <contact@example.com>".to_string(),
            contact_template: Some("New message from {name}".to_string()),
            auto_reply_template: Some("Thanks for reaching out".to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn fully_configured_report_is_valid_without_warnings() {
        let report = configured().email_report();
        assert!(report.is_valid);
        assert!(report.issues.is_empty());
        assert!(report.warnings.is_empty());
        assert!(report.has_api_key);
        assert!(report.has_contact_template);
        assert!(report.has_auto_reply_template);
    }

    #[test]
    fn missing_api_key_is_a_blocking_issue() {
        let config = AppConfig {
            resend_api_key: String::new(),
            ..configured()
        };
        let report = config.email_report();
        assert!(!report.is_valid);
        assert!(!report.has_api_key);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn missing_sender_and_templates_only_warn() {
        let config = AppConfig {
            contact_from: String::new(),
            contact_template: None,
            auto_reply_template: None,
            ..configured()
        };
        let report = config.email_report();
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 3);
        assert_eq!(config.sender_address(), DEFAULT_CONTACT_FROM);
    }

    #[test]
    fn missing_recipient_is_a_blocking_issue() {
        let config = AppConfig {
            contact_to: "  ".to_string(),
            ..configured()
        };
        assert!(!config.email_report().is_valid);
    }
}
