// Request monitor middleware
use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;

/// Client IP from proxy headers, else the peer address of the connection
fn extract_client_ip(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

/// Logs method, URI, status and latency of every request
pub async fn monitor_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    // Health probes and static images would drown the log
    let quiet = uri == "/api/health" || uri.starts_with("/images/");

    let start = Instant::now();
    let client_ip = extract_client_ip(&request);

    let response = next.run(request).await;

    let duration = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if quiet {
        tracing::trace!("[Monitor] {} {} → {} ({}ms)", method, uri, status, duration);
    } else {
        tracing::info!(
            "[Monitor] {} {} → {} ({}ms) client_ip={}",
            method,
            uri,
            status,
            duration,
            client_ip.as_deref().unwrap_or("-"),
        );
    }

    response
}
