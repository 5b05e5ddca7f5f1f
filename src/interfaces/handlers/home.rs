use actix_web::{HttpResponse, Responder, get};
use std::time::Duration;

use crate::constants::START_TIME;

#[get("/")]
pub async fn home() -> impl Responder {
    let uptime = chrono::Utc::now().signed_duration_since(*START_TIME);
    let uptime = humantime::format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Portfolio contact API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": uptime.to_string(),
        "endpoints": { "contact": "/api/contact" }
    }))
}
