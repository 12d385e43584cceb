//! Request handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::errors::AppError;
use common::models::{
    CreateSessionRequest, MessageReply, PostMessageRequest, SessionCreated, TranscriptResponse,
};
use common::response::ApiResponse;

use crate::service::ChatService;
use crate::state::AppState;

/// Opens a chat session from user credentials.
#[utoipa::path(
    post,
    path = "/api/chat/sessions",
    tag = "chat",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = ApiResponse<SessionCreated>),
        (status = 400, description = "Missing credentials"),
        (status = 502, description = "Database or LLM bootstrap failed")
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<ApiResponse<SessionCreated>>, AppError> {
    req.validate()?;

    let service = ChatService::new(state.config.clone(), state.sessions.clone());
    let data = service.create_session(req).await?;
    Ok(Json(ApiResponse::ok(data)))
}

/// Submits a user turn and returns the agent's reply.
#[utoipa::path(
    post,
    path = "/api/chat/sessions/{id}/messages",
    tag = "chat",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Turn processed", body = ApiResponse<MessageReply>),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<ApiResponse<MessageReply>>, AppError> {
    req.validate()?;

    let start = std::time::Instant::now();
    let service = ChatService::new(state.config.clone(), state.sessions.clone());
    let data = service.post_message(id, &req.message).await?;
    Ok(Json(ApiResponse::ok_with_duration(
        data,
        start.elapsed().as_millis() as u64,
    )))
}

/// Returns the full transcript of a session.
#[utoipa::path(
    get,
    path = "/api/chat/sessions/{id}/messages",
    tag = "chat",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Transcript", body = ApiResponse<TranscriptResponse>),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TranscriptResponse>>, AppError> {
    let service = ChatService::new(state.config.clone(), state.sessions.clone());
    let data = service.transcript(id).await?;
    Ok(Json(ApiResponse::ok(data)))
}

/// Ends a session and releases its database pool.
#[utoipa::path(
    delete,
    path = "/api/chat/sessions/{id}",
    tag = "chat",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session ended", body = ApiResponse<bool>),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let service = ChatService::new(state.config.clone(), state.sessions.clone());
    service.end_session(id).await?;
    Ok(Json(ApiResponse::ok(true)))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "chat-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        sessions: state.sessions.count().await,
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Live session count.
    pub sessions: usize,
}
