//! # Request/Response Logging Middleware
//!
//! One structured line per request and one per response, correlated by the
//! request ID from [`stamp_req`](super::stamp_req).
//!
//! Credentials never reach the log: sensitive headers are redacted and
//! bodies are never read.

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::RequestStamp;

/// Headers whose values are replaced with `***REDACTED***`.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
];

/// Endpoints whose requests carry passwords or tokens.
const SENSITIVE_ENDPOINTS: &[&str] = &[
    "/auth/jwt/login",
    "/auth/register",
    "/auth/reset-password",
    "/auth/verify",
    "/users/me",
];

fn is_sensitive_endpoint(path: &str) -> bool {
    SENSITIVE_ENDPOINTS.iter().any(|ep| path.starts_with(ep))
}

fn sanitized_headers(req: &Request) -> Vec<(String, String)> {
    req.headers()
        .iter()
        .filter_map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.iter().any(|h| name_lower.contains(h)) {
                Some((name.to_string(), "***REDACTED***".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect()
}

/// Request/response logging middleware.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|q| q.to_string());

    let request_id = req
        .extensions()
        .get::<RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let sensitive = is_sensitive_endpoint(&path);

    let client_ip = req
        .headers()
        .get("x-forwarded-for")
        .or_else(|| req.headers().get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        // Query strings on sensitive routes may carry tokens.
        query = ?query.as_ref().filter(|_| !sensitive),
        client_ip = ?client_ip,
        "[REQUEST] {} {}",
        method,
        path
    );
    debug!(
        request_id = %request_id,
        headers = ?sanitized_headers(&req),
        "[REQUEST HEADERS]"
    );

    let response = next.run(req).await;

    let elapsed_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();
    let summary = format!("[RESPONSE] {method} {path} -> {status} ({elapsed_ms}ms)");

    match response.status() {
        s if s.is_server_error() => {
            error!(request_id = %request_id, status, duration_ms = elapsed_ms, "{summary} [SERVER ERROR]")
        }
        s if s.is_client_error() => {
            warn!(request_id = %request_id, status, duration_ms = elapsed_ms, "{summary} [CLIENT ERROR]")
        }
        _ => info!(request_id = %request_id, status, duration_ms = elapsed_ms, "{summary}"),
    }

    response
}
