//! In-memory chat sessions.
//!
//! One `ChatSession` per connected user: the agent bound to their
//! credentials plus the ordered transcript. Everything lives in process
//! memory and disappears on restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use common::errors::{AppError, AppResult};
use common::models::{AgentStep, ChatTurn};

use crate::agent::SqlAgent;

/// Seeded assistant greeting, shown before the first question.
pub const GREETING: &str = "Hi! Ask me anything about your Supabase database.";
/// Reply used when the agent finishes without producing an answer.
pub const FALLBACK_OUTPUT: &str = "No output from agent.";
/// Prefix of assistant turns that report a failed turn.
pub const ERROR_PREFIX: &str = "❌ Error during agent execution: ";

/// One user's session: the agent plus the transcript.
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    agent: SqlAgent,
    /// Locked for the whole turn, so turns stay serialized and the
    /// transcript stays strictly alternating.
    transcript: Mutex<Vec<ChatTurn>>,
}

impl ChatSession {
    pub fn new(id: Uuid, agent: SqlAgent) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            agent,
            transcript: Mutex::new(vec![ChatTurn::assistant(GREETING)]),
        }
    }

    /// Appends the user turn, runs the agent, appends and returns the
    /// assistant turn. A failed turn becomes an error-marker reply; the
    /// session keeps accepting input afterwards.
    pub async fn submit(&self, text: &str) -> (ChatTurn, Vec<AgentStep>) {
        let mut transcript = self.transcript.lock().await;
        transcript.push(ChatTurn::user(text));

        let (content, steps) = match self.agent.run(text).await {
            Ok(outcome) => (
                outcome
                    .output
                    .unwrap_or_else(|| FALLBACK_OUTPUT.to_string()),
                outcome.steps,
            ),
            Err(e) => (format!("{}{}", ERROR_PREFIX, e), Vec::new()),
        };

        let reply = ChatTurn::assistant(content);
        transcript.push(reply.clone());
        (reply, steps)
    }

    /// Returns a copy of the transcript, oldest turn first.
    pub async fn transcript(&self) -> Vec<ChatTurn> {
        self.transcript.lock().await.clone()
    }
}

/// Process-local registry of live sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<ChatSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly bootstrapped session.
    pub async fn insert(&self, agent: SqlAgent) -> Arc<ChatSession> {
        let id = Uuid::new_v4();
        let session = Arc::new(ChatSession::new(id, agent));
        self.sessions.write().await.insert(id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Arc<ChatSession>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Drops a session and, with it, the database pool it owns.
    pub async fn remove(&self, id: Uuid) -> AppResult<Arc<ChatSession>> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use common::config::AgentSettings;
    use common::models::{QueryResult, Role, TableDescription};

    use crate::agent::llm::{ChatModel, Completion, ToolDef, WireMessage};
    use crate::agent::toolkit::DbToolkit;

    /// Always answers with the same text, no tool calls.
    struct FixedModel(&'static str);

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(
            &self,
            _messages: &[WireMessage],
            _tools: &[ToolDef],
        ) -> AppResult<Completion> {
            Ok(Completion {
                content: Some(self.0.to_string()),
                tool_calls: vec![],
            })
        }
    }

    /// Finishes without content and without tool calls.
    struct SilentModel;

    #[async_trait]
    impl ChatModel for SilentModel {
        async fn complete(
            &self,
            _messages: &[WireMessage],
            _tools: &[ToolDef],
        ) -> AppResult<Completion> {
            Ok(Completion {
                content: None,
                tool_calls: vec![],
            })
        }
    }

    /// Fails every call.
    struct BrokenModel;

    #[async_trait]
    impl ChatModel for BrokenModel {
        async fn complete(
            &self,
            _messages: &[WireMessage],
            _tools: &[ToolDef],
        ) -> AppResult<Completion> {
            Err(AppError::LlmApi("connection refused".into()))
        }
    }

    struct NoopToolkit;

    #[async_trait]
    impl DbToolkit for NoopToolkit {
        async fn list_tables(&self) -> AppResult<Vec<String>> {
            Ok(vec![])
        }

        async fn describe_table(&self, table: &str) -> AppResult<TableDescription> {
            Ok(TableDescription {
                table: table.to_string(),
                columns: vec![],
                sample_rows: vec![],
            })
        }

        async fn run_query(&self, _sql: &str, _limit: usize) -> AppResult<QueryResult> {
            Ok(QueryResult::empty())
        }
    }

    fn session_with(model: impl ChatModel + 'static) -> ChatSession {
        let agent = SqlAgent::new(
            Arc::new(model),
            Arc::new(NoopToolkit),
            AgentSettings {
                max_steps: 4,
                result_limit: 100,
                sample_rows: 3,
            },
        );
        ChatSession::new(Uuid::new_v4(), agent)
    }

    #[tokio::test]
    async fn test_transcript_starts_with_the_greeting() {
        let session = session_with(FixedModel("hello"));
        let turns = session.transcript().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::Assistant);
        assert_eq!(turns[0].content, GREETING);
    }

    #[tokio::test]
    async fn test_transcript_alternates_after_n_turns() {
        let session = session_with(FixedModel("42."));
        for question in ["q1", "q2", "q3"] {
            session.submit(question).await;
        }

        let turns = session.transcript().await;
        assert_eq!(turns.len(), 1 + 2 * 3);
        assert_eq!(turns[0].role, Role::Assistant);
        for pair in turns[1..].chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }

    #[tokio::test]
    async fn test_agent_failure_becomes_error_turn_and_session_survives() {
        let session = session_with(BrokenModel);

        let (reply, steps) = session.submit("q1").await;
        assert!(reply.content.starts_with(ERROR_PREFIX));
        assert!(steps.is_empty());

        // The session still accepts input after a failed turn.
        let (reply, _) = session.submit("q2").await;
        assert!(reply.content.starts_with(ERROR_PREFIX));
        assert_eq!(session.transcript().await.len(), 5);
    }

    #[tokio::test]
    async fn test_missing_output_uses_fallback_verbatim() {
        let session = session_with(SilentModel);
        let (reply, _) = session.submit("q").await;
        assert_eq!(reply.content, FALLBACK_OUTPUT);
    }

    #[tokio::test]
    async fn test_store_lookup_and_removal() {
        let store = SessionStore::new();
        assert_eq!(store.count().await, 0);

        let agent = SqlAgent::new(
            Arc::new(FixedModel("ok")),
            Arc::new(NoopToolkit),
            AgentSettings {
                max_steps: 4,
                result_limit: 100,
                sample_rows: 3,
            },
        );
        let session = store.insert(agent).await;
        assert_eq!(store.count().await, 1);
        assert!(store.get(session.id).await.is_ok());

        store.remove(session.id).await.unwrap();
        assert_eq!(store.count().await, 0);
        assert!(matches!(
            store.get(session.id).await,
            Err(AppError::SessionNotFound(_))
        ));
    }
}
