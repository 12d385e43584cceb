//! Service configuration.
//!
//! Loaded from environment variables, with defaults matching the hosted
//! Supabase transaction pooler this tool targets. The database password is
//! deliberately absent: it arrives per session from the user and is never
//! part of the process configuration.

use std::env;

/// Top-level runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and health output.
    pub service: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Target database endpoint.
    pub database: DatabaseSettings,
    /// LLM provider settings.
    pub llm: LlmSettings,
    /// SQL agent limits.
    pub agent: AgentSettings,
}

/// Fixed connection template for the target database. Only the password is
/// user-supplied; everything else is deployment configuration.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Transaction-pooler hostname.
    pub host: String,
    /// Transaction-pooler port.
    pub port: u16,
    /// Pooler username (project-scoped).
    pub username: String,
    /// Database name.
    pub database: String,
    /// Per-session pool size.
    pub max_connections: u32,
    /// Connect/acquire timeout in seconds.
    pub connect_timeout_secs: u64,
}

/// OpenAI-compatible chat-completions provider settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// API base, e.g. `https://api.groq.com/openai/v1`.
    pub api_base: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: u32,
}

/// Limits applied to the SQL agent loop.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Maximum model calls per user turn.
    pub max_steps: u32,
    /// Row cap applied to query results.
    pub result_limit: u32,
    /// Rows included when describing a table.
    pub sample_rows: u32,
}

impl AppConfig {
    /// Loads configuration for the given service from the environment.
    pub fn load_with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: env_parse_or("SERVER_PORT", 8080),
            database: DatabaseSettings {
                host: env_or(
                    "SUPABASE_POOLER_HOST",
                    "aws-0-ap-southeast-1.pooler.supabase.com",
                ),
                port: env_parse_or("SUPABASE_POOLER_PORT", 6543),
                username: env_or("SUPABASE_DB_USER", "postgres.uuqcbrjvfvwrybsmecpi"),
                database: env_or("SUPABASE_DB_NAME", "postgres"),
                max_connections: env_parse_or("DB_MAX_CONNECTIONS", 2),
                connect_timeout_secs: env_parse_or("DB_CONNECT_TIMEOUT_SECS", 10),
            },
            llm: LlmSettings {
                api_base: env_or("GROQ_API_BASE", "https://api.groq.com/openai/v1"),
                model: env_or("GROQ_MODEL", "llama3-8b-8192"),
                temperature: env_parse_or("GROQ_TEMPERATURE", 0.0),
                max_tokens: env_parse_or("GROQ_MAX_TOKENS", 1024),
            },
            agent: AgentSettings {
                max_steps: env_parse_or("AGENT_MAX_STEPS", 8),
                result_limit: env_parse_or("AGENT_RESULT_LIMIT", 100),
                sample_rows: env_parse_or("AGENT_SAMPLE_ROWS", 3),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
