//! SQL agent.
//!
//! A bounded tool-calling loop: the model decides which database tools to
//! invoke, observations (including tool errors) are fed back, and the loop
//! ends when the model answers in plain text or the step budget runs out.

pub mod llm;
pub mod toolkit;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use common::config::AgentSettings;
use common::errors::{AppError, AppResult};
use common::models::AgentStep;

use llm::{ChatModel, ToolDef, WireMessage, WireToolCall};
use toolkit::DbToolkit;

/// Hard upper bound for the per-query row cap, whatever the model asks for.
const MAX_RESULT_LIMIT: usize = 1000;
/// Observations longer than this are cut before being fed back to the model.
const MAX_OBSERVATION_CHARS: usize = 4000;

/// Outcome of one agent turn.
#[derive(Debug)]
pub struct AgentOutcome {
    /// Final natural-language answer; `None` when the step budget ran out
    /// before the model produced one.
    pub output: Option<String>,
    /// Tool invocations in execution order.
    pub steps: Vec<AgentStep>,
}

/// LLM-driven SQL agent bound to one database session.
pub struct SqlAgent {
    model: Arc<dyn ChatModel>,
    toolkit: Arc<dyn DbToolkit>,
    settings: AgentSettings,
}

impl SqlAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        toolkit: Arc<dyn DbToolkit>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            model,
            toolkit,
            settings,
        }
    }

    /// Runs the loop for one user question.
    pub async fn run(&self, question: &str) -> AppResult<AgentOutcome> {
        let tools = tool_definitions();
        let mut messages = vec![
            WireMessage::system(system_prompt(&self.settings)),
            WireMessage::user(question),
        ];
        let mut steps = Vec::new();

        for _ in 0..self.settings.max_steps {
            let completion = self.model.complete(&messages, &tools).await?;

            if completion.tool_calls.is_empty() {
                let output = completion.content.filter(|c| !c.trim().is_empty());
                return Ok(AgentOutcome { output, steps });
            }

            messages.push(WireMessage::assistant_with_tool_calls(
                completion.content.clone(),
                completion.tool_calls.clone(),
            ));

            for call in &completion.tool_calls {
                let observation = self.execute_tool(call, &mut steps).await;
                messages.push(WireMessage::tool_result(call.id.as_str(), observation));
            }
        }

        warn!(steps = steps.len(), "agent exhausted its step budget");
        Ok(AgentOutcome {
            output: None,
            steps,
        })
    }

    /// Executes one tool call. Errors become observations so the model can
    /// correct itself on the next step.
    async fn execute_tool(&self, call: &WireToolCall, steps: &mut Vec<AgentStep>) -> String {
        let name = call.function.name.as_str();
        let input: serde_json::Value =
            serde_json::from_str(&call.function.arguments).unwrap_or(serde_json::Value::Null);

        let observation = match self.dispatch(name, &call.function.arguments).await {
            Ok(obs) => truncate_observation(obs),
            Err(e) => format!("Error: {}", e),
        };

        info!(tool = name, observation_len = observation.len(), "agent tool call");
        steps.push(AgentStep {
            tool: name.to_string(),
            input,
            observation: observation.clone(),
        });
        observation
    }

    async fn dispatch(&self, name: &str, raw_args: &str) -> AppResult<String> {
        match name {
            "list_tables" => {
                let tables = self.toolkit.list_tables().await?;
                to_observation(&tables)
            }
            "describe_table" => {
                let args: DescribeTableArgs = parse_args(raw_args)?;
                let description = self.toolkit.describe_table(&args.table).await?;
                to_observation(&description)
            }
            "run_query" => {
                let args: RunQueryArgs = parse_args(raw_args)?;
                let limit = clamp_limit(args.limit, self.settings.result_limit);
                let result = self.toolkit.run_query(&args.sql, limit).await?;
                to_observation(&result)
            }
            other => Err(AppError::Agent(format!("unknown tool: {}", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DescribeTableArgs {
    table: String,
}

#[derive(Debug, Deserialize)]
struct RunQueryArgs {
    sql: String,
    limit: Option<u32>,
}

fn system_prompt(settings: &AgentSettings) -> String {
    format!(
        "You are an agent that answers questions about a PostgreSQL database.\n\
         Follow this workflow:\n\
         - Call list_tables to see the available tables.\n\
         - Call describe_table on any table before querying it.\n\
         - Write a single read-only SELECT statement and run it with run_query.\n\
         - Never issue INSERT, UPDATE, DELETE, DROP or any other mutation.\n\
         - Keep result sets at or below {} rows.\n\
         If a query fails, inspect the error and try a corrected query.\n\
         When you have the answer, reply in plain language without calling further tools.",
        settings.result_limit
    )
}

fn tool_definitions() -> Vec<ToolDef> {
    vec![
        ToolDef::function(
            "list_tables",
            "List the tables available in the database.",
            json!({"type": "object", "properties": {}, "required": []}),
        ),
        ToolDef::function(
            "describe_table",
            "Describe a table's columns and show a few sample rows.",
            json!({
                "type": "object",
                "properties": {
                    "table": {"type": "string", "description": "Table name"}
                },
                "required": ["table"]
            }),
        ),
        ToolDef::function(
            "run_query",
            "Execute a single read-only SQL SELECT statement.",
            json!({
                "type": "object",
                "properties": {
                    "sql": {"type": "string", "description": "The SELECT statement"},
                    "limit": {"type": "integer", "description": "Optional row cap"}
                },
                "required": ["sql"]
            }),
        ),
    ]
}

fn to_observation<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value).map_err(|e| AppError::Agent(e.to_string()))
}

fn parse_args<T: serde::de::DeserializeOwned>(raw: &str) -> AppResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("bad tool arguments: {}", e)))
}

fn clamp_limit(requested: Option<u32>, configured: u32) -> usize {
    let cap = (configured as usize).clamp(1, MAX_RESULT_LIMIT);
    match requested {
        Some(v) if v > 0 => (v as usize).min(cap),
        _ => cap,
    }
}

fn truncate_observation(obs: String) -> String {
    match obs.char_indices().nth(MAX_OBSERVATION_CHARS) {
        Some((idx, _)) => format!("{}... (truncated)", &obs[..idx]),
        None => obs,
    }
}
