//! Shared data models for the chat service.

pub mod chat;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use chat::{
    AgentStep, ChatTurn, CreateSessionRequest, MessageReply, PostMessageRequest, Role,
    SessionCreated, TranscriptResponse,
};
pub use query::{ColumnInfo, QueryResult};
pub use schema::TableDescription;
