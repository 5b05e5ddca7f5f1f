use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use crate::{
    AppState,
    email::resend::Mailer,
    entities::contact::{RawContactForm, RequestContext},
    errors::AppError,
    utils::get_client_ip::get_client_ip,
};

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn request_context(req: &HttpRequest) -> RequestContext {
    RequestContext::new(
        get_client_ip(req),
        header_value(req, "user-agent"),
        header_value(req, "referer"),
    )
}

pub async fn submit_contact<M: Mailer>(
    state: web::Data<AppState<M>>,
    req: HttpRequest,
    form: web::Json<RawContactForm>,
) -> Result<HttpResponse, AppError> {
    let ctx = request_context(&req);

    let receipt = state
        .contact_gateway
        .submit(form.into_inner(), &ctx)
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header(("X-RateLimit-Limit", receipt.rate.limit.to_string()))
        .insert_header(("X-RateLimit-Remaining", receipt.rate.remaining.to_string()))
        .insert_header(("X-RateLimit-Reset", receipt.rate.reset_at.to_string()))
        .json(receipt))
}

/// Health check for the contact pipeline: reports whether the email provider
/// configuration would allow a submission right now.
pub async fn contact_health<M: Mailer>(state: web::Data<AppState<M>>) -> HttpResponse {
    let report = state.contact_gateway.config().email_report();
    let status = if report.is_valid {
        "healthy"
    } else {
        "unhealthy"
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "emailConfig": report,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
