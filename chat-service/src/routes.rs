//! Route table.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat/sessions", post(handlers::create_session))
        .route("/api/chat/sessions/{id}", delete(handlers::delete_session))
        .route(
            "/api/chat/sessions/{id}/messages",
            get(handlers::get_transcript).post(handlers::post_message),
        )
        .route("/api/health", get(handlers::health_check))
}
