//! Chat service orchestration.
//!
//! Bootstraps sessions (pool → model client → toolkit → agent) and routes
//! turns to them. The first failure in the bootstrap chain aborts it;
//! nothing partial is ever stored.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{
    ChatTurn, CreateSessionRequest, MessageReply, SessionCreated, TranscriptResponse,
};
use common::utils::postgres_url;

use crate::agent::llm::GroqChatModel;
use crate::agent::toolkit::PgToolkit;
use crate::agent::SqlAgent;
use crate::session::{SessionStore, GREETING};

/// Orchestrates session bootstrap and turn handling.
pub struct ChatService {
    config: AppConfig,
    store: Arc<SessionStore>,
}

impl ChatService {
    pub fn new(config: AppConfig, store: Arc<SessionStore>) -> Self {
        Self { config, store }
    }

    /// Opens a session: builds the connection string, connects a pool,
    /// constructs the model client and the agent.
    pub async fn create_session(&self, req: CreateSessionRequest) -> AppResult<SessionCreated> {
        let db = &self.config.database;
        let url = postgres_url(&db.username, &req.db_password, &db.host, db.port, &db.database);

        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .acquire_timeout(Duration::from_secs(db.connect_timeout_secs))
            .connect(&url)
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        let model = Arc::new(GroqChatModel::new(req.api_key, self.config.llm.clone()));
        let toolkit = Arc::new(PgToolkit::new(pool, self.config.agent.sample_rows));
        let agent = SqlAgent::new(model, toolkit, self.config.agent.clone());

        let session = self.store.insert(agent).await;
        info!(session_id = %session.id, "chat session created");

        Ok(SessionCreated {
            session_id: session.id,
            greeting: ChatTurn::assistant(GREETING),
        })
    }

    /// Runs one user turn through the session's agent.
    pub async fn post_message(&self, id: Uuid, text: &str) -> AppResult<MessageReply> {
        let session = self.store.get(id).await?;
        let (reply, steps) = session.submit(text).await;
        Ok(MessageReply { reply, steps })
    }

    /// Returns the full ordered transcript.
    pub async fn transcript(&self, id: Uuid) -> AppResult<TranscriptResponse> {
        let session = self.store.get(id).await?;
        Ok(TranscriptResponse {
            session_id: id,
            turns: session.transcript().await,
        })
    }

    /// Ends a session and releases its database pool.
    pub async fn end_session(&self, id: Uuid) -> AppResult<()> {
        let session = self.store.remove(id).await?;
        let lived_secs = (chrono::Utc::now() - session.created_at).num_seconds();
        info!(session_id = %id, lived_secs, "chat session ended");
        Ok(())
    }
}
