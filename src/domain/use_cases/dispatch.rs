use ammonia::clean_text;
use anyhow::bail;
use futures::join;

use crate::{
    email::resend::Mailer,
    entities::{
        contact::{ContactSubmission, RequestContext},
        email::{DispatchOutcome, OutboundEmail, SendOutcome},
    },
    errors::AppError,
    settings::AppConfig,
};

const DEFAULT_CONTACT_SUBJECT: &str = "New portfolio contact from {name}";
const DEFAULT_AUTO_REPLY_SUBJECT: &str = "Thanks for getting in touch!";

/// Builds and sends the two messages for one submission: the owner
/// notification and the sender auto-reply. The sends run concurrently and
/// fail independently; each outcome is captured on its own.
pub struct EmailDispatcher<M>
where
    M: Mailer,
{
    mailer: M,
    from: String,
    to: String,
    site_url: String,
    contact_subject: String,
    auto_reply_subject: String,
}

impl<M> EmailDispatcher<M>
where
    M: Mailer,
{
    pub fn new(mailer: M, config: &AppConfig) -> Self {
        EmailDispatcher {
            mailer,
            from: config.sender_address(),
            to: config.contact_to.trim().to_string(),
            site_url: config.site_url.to_string(),
            contact_subject: config
                .contact_template
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTACT_SUBJECT.to_string()),
            auto_reply_subject: config
                .auto_reply_template
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTO_REPLY_SUBJECT.to_string()),
        }
    }

    /// Errors only when no send could be attempted at all; provider-level
    /// failures are converted into the per-message outcomes instead.
    pub async fn send_contact_emails(
        &self,
        submission: &ContactSubmission,
        ctx: &RequestContext,
    ) -> Result<DispatchOutcome, AppError> {
        self.ensure_addresses()?;

        let notification = self.build_notification(submission, ctx);
        let auto_reply = self.build_auto_reply(submission);

        let (notification_result, auto_reply_result) = join!(
            self.mailer.send(&notification),
            self.mailer.send(&auto_reply)
        );

        if let Err(e) = &notification_result {
            tracing::error!(
                request_id = %ctx.request_id,
                configuration = e.is_configuration(),
                "notification send failed: {e}"
            );
        }
        if let Err(e) = &auto_reply_result {
            tracing::error!(
                request_id = %ctx.request_id,
                configuration = e.is_configuration(),
                "auto-reply send failed: {e}"
            );
        }

        Ok(DispatchOutcome {
            notification: SendOutcome::from_result(notification_result),
            auto_reply: SendOutcome::from_result(auto_reply_result),
        })
    }

    fn ensure_addresses(&self) -> anyhow::Result<()> {
        if self.to.is_empty() {
            bail!("contact recipient address is not configured");
        }
        if self.from.is_empty() {
            bail!("sender address is not configured");
        }
        Ok(())
    }

    fn build_notification(
        &self,
        submission: &ContactSubmission,
        ctx: &RequestContext,
    ) -> OutboundEmail {
        let received = ctx.received_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let company = if submission.company.is_empty() {
            "-"
        } else {
            submission.company.as_str()
        };

        let text_body = format!(
            "New contact form submission\n\n\
             Name: {name}\n\
             Email: {email}\n\
             Company: {company}\n\
             Received: {received}\n\n\
             Message:\n{message}\n",
            name = submission.name,
            email = submission.email,
            message = submission.message,
        );

        let html_body = format!(
            "<h2>New contact form submission</h2>\
             <p><strong>Name:</strong> {name}</p>\
             <p><strong>Email:</strong> {email}</p>\
             <p><strong>Company:</strong> {company}</p>\
             <p><strong>Received:</strong> {received}</p>\
             <p><strong>Message:</strong></p>\
             <p>{message}</p>",
            name = clean_text(&submission.name),
            email = clean_text(&submission.email),
            company = clean_text(company),
            message = clean_text(&submission.message),
        );

        OutboundEmail {
            to: self.to.clone(),
            from: self.from.clone(),
            subject: self.contact_subject.replace("{name}", &submission.name),
            text_body,
            html_body,
        }
    }

    fn build_auto_reply(&self, submission: &ContactSubmission) -> OutboundEmail {
        let text_body = format!(
            "Hi {name},\n\n\
             Thanks for reaching out! Your message has been received and I'll \
             get back to you as soon as I can, usually within a couple of days.\n\n\
             In the meantime, feel free to browse {site}.\n\n\
             Best regards",
            name = submission.name,
            site = self.site_url,
        );

        let html_body = format!(
            "<p>Hi {name},</p>\
             <p>Thanks for reaching out! Your message has been received and I'll \
             get back to you as soon as I can, usually within a couple of days.</p>\
             <p>In the meantime, feel free to browse \
             <a href=\"{site}\">{site}</a>.</p>\
             <p>Best regards</p>",
            name = clean_text(&submission.name),
            site = self.site_url,
        );

        OutboundEmail {
            to: submission.email.clone(),
            from: self.from.clone(),
            subject: self.auto_reply_subject.clone(),
            text_body,
            html_body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::resend::{MailerError, MockMailer};

    fn test_config() -> AppConfig {
        AppConfig {
            resend_api_key: "re_test_key".to_string(),
            contact_to: "owner@example.com".to_string(),
            contact_from: "Site <contact@example.com>".to_string(),
            ..AppConfig::default()
        }
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            company: String::new(),
            message: "Interested in collaborating on a project together.".to_string(),
        }
    }

    fn context() -> RequestContext {
        RequestContext::new("203.0.113.7".to_string(), None, None)
    }

    #[test]
    fn notification_carries_submission_fields() {
        let dispatcher = EmailDispatcher::new(MockMailer::new(), &test_config());
        let email = dispatcher.build_notification(&submission(), &context());

        assert_eq!(email.to, "owner@example.com");
        assert_eq!(email.subject, "New portfolio contact from Ada");
        assert!(email.text_body.contains("ada@example.com"));
        assert!(email.text_body.contains("Company: -"));
        assert!(email.html_body.contains("ada@example.com"));
    }

    #[test]
    fn html_rendering_escapes_user_input() {
        let dispatcher = EmailDispatcher::new(MockMailer::new(), &test_config());
        let mut sub = submission();
        sub.message = "<script>alert(1)</script> hello".to_string();
        let email = dispatcher.build_notification(&sub, &context());
        assert!(!email.html_body.contains("<script>"));
    }

    #[test]
    fn auto_reply_goes_to_the_sender() {
        let dispatcher = EmailDispatcher::new(MockMailer::new(), &test_config());
        let email = dispatcher.build_auto_reply(&submission());
        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, DEFAULT_AUTO_REPLY_SUBJECT);
        assert!(email.text_body.contains("Hi Ada"));
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_other_send() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email: &OutboundEmail| email.to == "owner@example.com")
            .returning(|_| Ok(()));
        mailer
            .expect_send()
            .withf(|email: &OutboundEmail| email.to == "ada@example.com")
            .returning(|_| Err(MailerError::Network("connection reset".to_string())));

        let dispatcher = EmailDispatcher::new(mailer, &test_config());
        let outcome = dispatcher
            .send_contact_emails(&submission(), &context())
            .await
            .expect("sends were attempted");

        assert!(outcome.notification.success);
        assert!(!outcome.auto_reply.success);
        assert!(outcome.auto_reply.error.is_some());
    }

    #[tokio::test]
    async fn missing_recipient_means_nothing_is_attempted() {
        let config = AppConfig {
            contact_to: String::new(),
            ..test_config()
        };
        // No expectations: any send call would panic.
        let dispatcher = EmailDispatcher::new(MockMailer::new(), &config);
        let err = dispatcher
            .send_contact_emails(&submission(), &context())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable));
    }
}
