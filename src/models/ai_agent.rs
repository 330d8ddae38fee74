// src/models/ai_agent.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_AGENT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: i32 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiAgent {
    pub id: Uuid,
    #[schema(example = "Atendente SmartZap")]
    pub name: String,
    pub system_prompt: String,
    #[schema(example = "gemini-2.0-flash")]
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    // Store do File Search onde os documentos do agente foram indexados
    pub file_search_store_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AiAgent {
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(DEFAULT_AGENT_MODEL)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TestAgentPayload {
    #[validate(length(min = 1, max = 2000, message = "message_length"))]
    #[schema(example = "Qual o horário de atendimento?")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SourceRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

// Resposta em snake_case, como o painel já consome
#[derive(Debug, Serialize, ToSchema)]
pub struct TestAgentResponse {
    pub response: String,
    pub latency_ms: u64,
    pub model: Option<String>,
    pub knowledge_files_used: i64,
    pub file_search_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
    pub tool_calls_count: usize,
    pub steps_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub grounding_metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}
