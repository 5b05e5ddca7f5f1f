use actix_web::{
    HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode, web,
};
use serde_json::json;

use crate::{
    email::resend::Mailer,
    handlers::{
        contact::{contact_health, submit_contact},
        home::home,
    },
};

pub fn configure_routes<M: Mailer>(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::resource("/api/contact")
            .route(web::post().to(submit_contact::<M>))
            .route(web::get().to(contact_health::<M>)),
    );

    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| JsonError::from(err).into()),
    );
}

/// Maps malformed request bodies to the same `{ "error": ... }` shape the
/// rest of the API uses.
#[derive(Debug)]
pub struct JsonError {
    message: String,
    status: StatusCode,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<JsonPayloadError> for JsonError {
    fn from(err: JsonPayloadError) -> Self {
        JsonError {
            message: format!("JSON payload error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}
