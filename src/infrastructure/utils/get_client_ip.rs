use actix_web::HttpRequest;

/// Proxy headers consulted in order; the first hop of a comma-separated
/// value wins.
const CLIENT_IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Derives the client identifier used for rate limiting: forwarding headers
/// first, then the transport peer address, then the literal "unknown".
pub fn get_client_ip(req: &HttpRequest) -> String {
    for header in CLIENT_IP_HEADERS {
        if let Some(value) = req.headers().get(header) {
            if let Ok(s) = value.to_str() {
                let first = s.split(',').next().unwrap_or("").trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
