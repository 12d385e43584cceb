//! Chat session models.
//!
//! Contains the transcript turn type and the request/response bodies of the
//! chat endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing questions.
    User,
    /// The SQL agent.
    Assistant,
}

/// One role-tagged message in a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    /// Who authored the turn.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatTurn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for opening a chat session.
///
/// Both secrets are held in memory for the session's lifetime only and are
/// never serialized back out.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSessionRequest {
    /// Groq API key.
    #[validate(length(min = 1, message = "Groq API key is required"))]
    pub api_key: String,

    /// Database password for the pooler user.
    #[validate(length(min = 1, message = "Database password is required"))]
    pub db_password: String,
}

/// Response body for a newly created session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionCreated {
    /// Session identifier for subsequent requests.
    pub session_id: Uuid,
    /// Seeded assistant greeting.
    pub greeting: ChatTurn,
}

/// Request body for submitting a user turn.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostMessageRequest {
    /// The user's question.
    #[validate(length(min = 1, message = "Message must not be empty"))]
    pub message: String,
}

/// One intermediate action the agent took while answering a turn.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentStep {
    /// Tool name (`list_tables`, `describe_table`, `run_query`).
    pub tool: String,
    /// Tool arguments as supplied by the model.
    pub input: serde_json::Value,
    /// Observation fed back to the model (may be an error message).
    pub observation: String,
}

/// Response body for a processed turn.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageReply {
    /// The appended assistant turn.
    pub reply: ChatTurn,
    /// Intermediate agent actions, in execution order.
    pub steps: Vec<AgentStep>,
}

/// Full ordered transcript of a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct TranscriptResponse {
    /// Session identifier.
    pub session_id: Uuid,
    /// Every turn, oldest first.
    pub turns: Vec<ChatTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_empty_credentials_fail_validation() {
        let req = CreateSessionRequest {
            api_key: String::new(),
            db_password: "secret".into(),
        };
        assert!(req.validate().is_err());

        let req = CreateSessionRequest {
            api_key: "gsk_test".into(),
            db_password: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_present_credentials_pass_validation() {
        let req = CreateSessionRequest {
            api_key: "gsk_test".into(),
            db_password: "p@ss/word".into(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = ChatTurn::user("hi");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
    }
}
