// Bearer-token authentication

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::ChatServer;

/// Reject requests without the configured bearer token.
/// A missing or placeholder service key turns the check off.
pub async fn auth_middleware(
    State(server): State<Arc<ChatServer>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = server.config().required_token() else {
        return next.run(request).await;
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let rejection = match header_value.and_then(|value| value.strip_prefix("Bearer ")) {
        None => Some("Thiếu Authorization header"),
        Some(token) if token.trim() != expected => {
            tracing::warn!("Rejected request with invalid API key");
            Some("API key không hợp lệ")
        }
        Some(_) => None,
    };

    match rejection {
        Some(message) => unauthorized(message),
        None => next.run(request).await,
    }
}

fn unauthorized(message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "message": message,
            "type": "unauthorized"
        }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
