// HTTP request handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::middleware::auth_middleware;
use super::ChatServer;
use crate::dialogue::{HistoryExport, TurnRequest};
use crate::emotion::{BiometricSnapshot, EmotionalLevel};
use crate::errors::{ChatError, ValidationError};
use crate::metrics::hash_user_id;

const DEFAULT_USER_ID: &str = "default_user";

const GENERATION_FAILED_MESSAGE: &str =
    "Xin lỗi, MISOUL đang gặp sự cố khi tạo phản hồi. Vui lòng thử lại sau.";

/// Create the main application router
pub fn create_router(server: Arc<ChatServer>) -> Router {
    let protected = Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/clear_history", post(clear_history))
        .route("/api/history", post(export_history))
        .route("/api/save_history", post(save_history))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&server),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(server)
}

/// Request body for POST /api/chat
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub emotional_level: Option<i64>,
    #[serde(default, alias = "biometrics")]
    pub biometric_data: Option<BiometricSnapshot>,
}

impl ChatRequest {
    /// Validate and apply defaults (`default_user`, level 1)
    pub fn into_turn(self) -> Result<TurnRequest, ValidationError> {
        let message = self.message.ok_or(ValidationError::MissingField("message"))?;
        let level = match self.emotional_level {
            Some(level) => EmotionalLevel::new(level)?,
            None => EmotionalLevel::default(),
        };
        let user_id = self.user_id.unwrap_or_else(|| DEFAULT_USER_ID.to_string());

        let mut turn = TurnRequest::new(user_id, message, level);
        turn.biometrics = self.biometric_data;
        Ok(turn)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub messages: Vec<String>,
    pub waiting_confirmation: bool,
}

/// Response body for POST /api/chat
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: ChatResponseBody,
    pub user_id: String,
    pub emotional_level: EmotionalLevel,
    /// Seconds
    pub processing_time: f64,
}

/// Request body for the history endpoints
#[derive(Debug, Default, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Export only the most recent turns
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl UserRequest {
    fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
    }
}

#[derive(Debug, Serialize)]
struct StatusMessage {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filepath: Option<String>,
}

impl StatusMessage {
    fn new(status: &'static str, message: String) -> Self {
        Self {
            status,
            message,
            filepath: None,
        }
    }
}

/// Handle POST /api/chat
async fn handle_chat(
    State(server): State<Arc<ChatServer>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let turn = request.into_turn()?;
    let user_id = turn.user_id.clone();
    let level = turn.level;

    let outcome = server.service().handle_turn(turn).await?;
    let processing_time = start.elapsed().as_secs_f64();

    tracing::info!(
        request_id = %request_id,
        user = %hash_user_id(&user_id),
        emotional_level = %level,
        processing_time,
        "Chat request handled"
    );

    Ok(Json(ChatResponse {
        response: ChatResponseBody {
            messages: outcome.messages,
            waiting_confirmation: outcome.awaiting_confirmation,
        },
        user_id,
        emotional_level: level,
        processing_time,
    }))
}

/// Handle POST /api/clear_history
async fn clear_history(
    State(server): State<Arc<ChatServer>>,
    Json(request): Json<UserRequest>,
) -> Json<StatusMessage> {
    let user_id = request.user_id();
    let status = if server.service().clear_history(user_id).await {
        StatusMessage::new(
            "success",
            format!("Đã xóa lịch sử trò chuyện của user_id: {}", user_id),
        )
    } else {
        StatusMessage::new(
            "warning",
            format!("Không tìm thấy lịch sử trò chuyện cho user_id: {}", user_id),
        )
    };
    Json(status)
}

/// Handle POST /api/history - export as JSON
async fn export_history(
    State(server): State<Arc<ChatServer>>,
    Json(request): Json<UserRequest>,
) -> Result<Json<HistoryExport>, AppError> {
    let mut export = server.service().export_history(request.user_id()).await?;
    if let Some(max_items) = request.max_items {
        let skip = export.turns.len().saturating_sub(max_items);
        export.turns.drain(..skip);
    }
    Ok(Json(export))
}

/// Handle POST /api/save_history - write the export to the history directory
async fn save_history(
    State(server): State<Arc<ChatServer>>,
    Json(request): Json<UserRequest>,
) -> Result<Json<StatusMessage>, AppError> {
    let dir = &server.config().history_dir;
    match server.service().save_history(request.user_id(), dir).await {
        Ok(path) => Ok(Json(StatusMessage {
            status: "success",
            message: "Đã lưu lịch sử trò chuyện thành công".to_string(),
            filepath: Some(path.display().to_string()),
        })),
        Err(ChatError::HistoryNotFound(_)) => Ok(Json(StatusMessage::new(
            "warning",
            "Không có lịch sử trò chuyện để lưu".to_string(),
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
    pub version: String,
    pub provider: String,
    pub active_sessions: usize,
    pub uptime_seconds: u64,
}

/// Handle GET /api/health
pub async fn health_check(State(server): State<Arc<ChatServer>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        message: "MISOUL API đang hoạt động bình thường".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: server.service().generator_name().to_string(),
        active_sessions: server.service().active_sessions(),
        uptime_seconds: server.uptime_seconds(),
    })
}

/// Handle GET /metrics - Prometheus metrics endpoint
pub async fn metrics_endpoint(State(server): State<Arc<ChatServer>>) -> Result<Response, AppError> {
    let metrics = server.service().metrics().render()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
        .into_response())
}

/// Application error wrapper for proper HTTP error responses
#[derive(Debug)]
pub enum AppError {
    Chat(ChatError),
    Internal(anyhow::Error),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        Self::Chat(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Chat(ChatError::Validation(err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn error_body(message: &str, error_type: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "message": message,
            "type": error_type
        }
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Chat(ChatError::Validation(e)) => {
                tracing::debug!(error = %e, "Rejected invalid request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(error_body(&e.to_string(), "validation_error")),
                )
                    .into_response()
            }
            AppError::Chat(ChatError::HistoryNotFound(_)) => (
                StatusCode::NOT_FOUND,
                Json(error_body("Không tìm thấy lịch sử trò chuyện", "not_found")),
            )
                .into_response(),
            AppError::Chat(ChatError::Generation { source, messages }) => {
                tracing::error!(error = %source, "Turn failed during generation");
                let mut body = error_body(GENERATION_FAILED_MESSAGE, "generation_error");
                body["error"]["reason"] = source.reason().into();
                body["messages"] = messages.into();
                (StatusCode::BAD_GATEWAY, Json(body)).into_response()
            }
            AppError::Chat(ChatError::Storage(e)) | AppError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(error_body(&e.to_string(), "api_error")),
                )
                    .into_response()
            }
        }
    }
}
