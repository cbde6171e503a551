// Bearer token authentication middleware
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::proxy::error::ProxyError;
use crate::proxy::security::{ProxySecurityConfig, TokenCheck};

/// Extract the token from `Authorization: Bearer <token>`.
/// Any other scheme counts as no token at all.
fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Rejects requests to protected paths without the configured bearer token.
/// 401 when the token is absent, 403 when it does not match.
pub async fn auth_middleware(
    State(security): State<Arc<ProxySecurityConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Allow CORS preflight
    if method == axum::http::Method::OPTIONS {
        return next.run(request).await;
    }

    if !security.requires_auth(&path) {
        tracing::trace!("Public route: {} {}", method, path);
        return next.run(request).await;
    }

    let token = extract_bearer_token(&request);
    match security.check_token(token.as_deref()) {
        TokenCheck::Authorized => next.run(request).await,
        TokenCheck::Missing => {
            tracing::warn!("Rejected {} {}: token required", method, path);
            ProxyError::MissingToken.into_response()
        }
        TokenCheck::Invalid => {
            tracing::warn!("Rejected {} {}: invalid token", method, path);
            ProxyError::InvalidToken.into_response()
        }
    }
}
