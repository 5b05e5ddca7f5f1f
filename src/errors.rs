use std::fmt;

use actix_web::{
    HttpResponse,
    error::ResponseError,
    http::{StatusCode, header::ContentType},
};
use chrono::Utc;
use serde::Serialize;

pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Service temporarily unavailable. Please try again later.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Failed to send message. Please try again.";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";

#[derive(Debug)]
pub enum AppError {
    Validation(FieldError),
    RateLimited {
        limit: u32,
        /// Window reset as epoch milliseconds.
        reset_at: i64,
    },
    ServiceUnavailable,
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "validation error: {}: {}", e.field, e.message),
            AppError::RateLimited { reset_at, .. } => {
                write!(f, "rate limited until {}", reset_at)
            }
            AppError::ServiceUnavailable => write!(f, "service unavailable"),
            AppError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(e) => HttpResponse::build(self.status_code())
                .insert_header(ContentType::json())
                .json(serde_json::json!({ "error": e.message })),
            AppError::RateLimited { limit, reset_at } => {
                let now_ms = Utc::now().timestamp_millis();
                let retry_after_secs = ((reset_at - now_ms).max(0) + 999) / 1000;
                HttpResponse::build(self.status_code())
                    .insert_header(ContentType::json())
                    .insert_header(("Retry-After", retry_after_secs.to_string()))
                    .insert_header(("X-RateLimit-Limit", limit.to_string()))
                    .insert_header(("X-RateLimit-Remaining", "0"))
                    .insert_header(("X-RateLimit-Reset", reset_at.to_string()))
                    .json(serde_json::json!({
                        "error": RATE_LIMITED_MESSAGE,
                        "resetTime": reset_at
                    }))
            }
            AppError::ServiceUnavailable => HttpResponse::build(self.status_code())
                .insert_header(ContentType::json())
                .json(serde_json::json!({ "error": SERVICE_UNAVAILABLE_MESSAGE })),
            // The detail stays server-side; callers get a fixed message.
            AppError::Internal(_) => HttpResponse::build(self.status_code())
                .insert_header(ContentType::json())
                .json(serde_json::json!({ "error": INTERNAL_ERROR_MESSAGE })),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(FieldError {
            field: field.to_string(),
            message: message.into(),
        })
    }
}

/// Classifies unexpected failures before they cross the API boundary:
/// anything that looks like a configuration or template problem becomes 503,
/// everything else a generic 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let msg = err.to_string();
        let lower = msg.to_lowercase();
        if ["config", "template", "api key", "unauthorized", "credential"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            tracing::error!("configuration problem behind submission failure: {msg}");
            AppError::ServiceUnavailable
        } else {
            AppError::Internal(msg)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn configuration_looking_errors_map_to_service_unavailable() {
        let err: AppError = anyhow!("email sender is not configured").into();
        assert!(matches!(err, AppError::ServiceUnavailable));

        let err: AppError = anyhow!("invalid template reference").into();
        assert!(matches!(err, AppError::ServiceUnavailable));
    }

    #[test]
    fn other_errors_map_to_internal() {
        let err: AppError = anyhow!("boom").into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn rate_limited_response_carries_retry_metadata() {
        let reset_at = Utc::now().timestamp_millis() + 60_000;
        let err = AppError::RateLimited {
            limit: 3,
            reset_at,
        };
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let headers = response.headers();
        let retry_after: i64 = headers
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .expect("Retry-After header present and numeric");
        assert!(retry_after >= 1 && retry_after <= 60);
        assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "0");
        assert_eq!(
            headers.get("X-RateLimit-Reset").unwrap(),
            reset_at.to_string().as_str()
        );
    }

    #[test]
    fn internal_detail_is_not_echoed() {
        let err = AppError::Internal("secret provider body".to_string());
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
