use chrono::Duration;

use crate::{
    email::resend::Mailer,
    entities::{
        contact::{RateStatus, RawContactForm, RequestContext, SubmissionReceipt},
        email::EmailResults,
    },
    errors::AppError,
    limiter::rate_limiter::RateLimiterStore,
    settings::AppConfig,
    use_cases::dispatch::EmailDispatcher,
};

/// Orchestrates one contact submission: configuration check, field
/// validation, rate limiting, sanitization, then email dispatch. Failures
/// before dispatch produce typed errors and no side effects.
pub struct ContactGateway<M>
where
    M: Mailer,
{
    dispatcher: EmailDispatcher<M>,
    limiter: RateLimiterStore,
    config: AppConfig,
}

impl<M> ContactGateway<M>
where
    M: Mailer,
{
    pub fn new(mailer: M, limiter: RateLimiterStore, config: AppConfig) -> Self {
        ContactGateway {
            dispatcher: EmailDispatcher::new(mailer, &config),
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn limiter(&self) -> &RateLimiterStore {
        &self.limiter
    }

    pub async fn submit(
        &self,
        form: RawContactForm,
        ctx: &RequestContext,
    ) -> Result<SubmissionReceipt, AppError> {
        let report = self.config.email_report();
        if !report.is_valid {
            // Which credential is missing stays out of the response.
            tracing::error!(
                request_id = %ctx.request_id,
                "submission refused, email configuration invalid: {}",
                report.issues.join("; ")
            );
            return Err(AppError::ServiceUnavailable);
        }

        if let Err(e) = form.validate() {
            tracing::debug!(request_id = %ctx.request_id, "submission rejected: {e}");
            return Err(e);
        }

        let limit = self.config.rate_limit_max_requests;
        let window = Duration::milliseconds(self.config.rate_limit_window_ms);
        let decision = self
            .limiter
            .check_and_consume(&ctx.client_ip, limit, window);

        if !decision.allowed {
            let wait = (decision.reset_at - chrono::Utc::now())
                .to_std()
                .unwrap_or_default();
            tracing::info!(
                request_id = %ctx.request_id,
                client_ip = %ctx.client_ip,
                "rate limited, window resets in {}",
                humantime::format_duration(std::time::Duration::from_secs(wait.as_secs()))
            );
            return Err(AppError::RateLimited {
                limit,
                reset_at: decision.reset_at.timestamp_millis(),
            });
        }

        let submission = form.sanitize();

        let outcome = self.dispatcher.send_contact_emails(&submission, ctx).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            client_ip = %ctx.client_ip,
            notification = outcome.notification.success,
            auto_reply = outcome.auto_reply.success,
            "contact submission processed"
        );

        Ok(SubmissionReceipt {
            success: true,
            message: "Your message has been sent. Thank you for reaching out!".to_string(),
            email_results: EmailResults::from(&outcome),
            rate: RateStatus {
                limit,
                remaining: decision.remaining,
                reset_at: decision.reset_at.timestamp_millis(),
            },
        })
    }
}
