use serde::Serialize;

/// A message handed to the mailer; discarded once the send call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Outcome of a single send attempt. The error text is for server-side logs
/// only and is never surfaced to the caller.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => SendOutcome {
                success: true,
                error: None,
            },
            Err(e) => SendOutcome {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Per-message outcomes of one dispatch. The two sends are independent; one
/// failing never rolls back the other.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub notification: SendOutcome,
    pub auto_reply: SendOutcome,
}

/// Boolean view of the dispatch outcome exposed in the response body.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailResults {
    pub notification: bool,
    pub auto_reply: bool,
}

impl From<&DispatchOutcome> for EmailResults {
    fn from(outcome: &DispatchOutcome) -> Self {
        EmailResults {
            notification: outcome.notification.success,
            auto_reply: outcome.auto_reply.success,
        }
    }
}
