// src/services/generative.rs
//
// Contrato entre o serviço de agentes e o provedor de IA generativa.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::ai_agent::{SourceRef, TokenUsage};

/// Erros que podem ocorrer ao falar com o provedor de IA.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// API key rejeitada (HTTP 401/403, ou 400 com "API key" na mensagem).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// HTTP 429 transitório.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Quota/billing esgotado (RESOURCE_EXHAUSTED).
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Ferramenta de busca semântica sobre os documentos indexados do agente.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSearchTool {
    pub store_name: String,
    pub top_k: u32,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f64,
    pub max_output_tokens: i32,
    pub file_search: Option<FileSearchTool>,
    // Limite de idas e voltas com ferramentas
    pub max_steps: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationResult {
    pub text: String,
    pub sources: Vec<SourceRef>,
    pub tool_calls_count: usize,
    pub steps_count: usize,
    pub grounding_metadata: Option<Value>,
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ProviderError>;
}
