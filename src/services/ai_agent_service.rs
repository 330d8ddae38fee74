// src/services/ai_agent_service.rs

use std::{sync::Arc, time::Instant};

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{settings_repo, AiAgentRepository, SettingsRepository},
    models::ai_agent::{AiAgent, TestAgentResponse, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
    services::generative::{FileSearchTool, GenerationRequest, GenerativeProvider},
};

const FILE_SEARCH_TOP_K: u32 = 5;
const FILE_SEARCH_MAX_STEPS: usize = 5;

#[derive(Clone)]
pub struct AiAgentService {
    agent_repo: AiAgentRepository,
    settings_repo: SettingsRepository,
    provider: Arc<dyn GenerativeProvider>,
    // GEMINI_API_KEY do ambiente, usada quando a tabela settings não tem a chave
    fallback_api_key: Option<String>,
}

impl AiAgentService {
    pub fn new(
        agent_repo: AiAgentRepository,
        settings_repo: SettingsRepository,
        provider: Arc<dyn GenerativeProvider>,
        fallback_api_key: Option<String>,
    ) -> Self {
        Self { agent_repo, settings_repo, provider, fallback_api_key }
    }

    /// Executa o agente com uma mensagem de teste antes de ativá-lo.
    pub async fn test_agent<'e, E>(
        &self,
        executor: E,
        agent_id: &str,
        message: &str,
    ) -> Result<TestAgentResponse, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        // Id malformado é tratado como agente inexistente
        let agent_id = Uuid::parse_str(agent_id).map_err(|_| AppError::AgentNotFound)?;

        let agent = self
            .agent_repo
            .find_by_id(executor, agent_id)
            .await?
            .ok_or(AppError::AgentNotFound)?;

        let indexed_files = self.agent_repo.count_indexed_files(executor, agent.id).await?;

        let api_key = self
            .settings_repo
            .get_value(executor, settings_repo::GEMINI_API_KEY)
            .await?
            .or_else(|| self.fallback_api_key.clone().filter(|k| !k.trim().is_empty()))
            .ok_or(AppError::AiKeyNotConfigured)?;

        let request = build_request(&agent, indexed_files, message);
        let file_search_enabled = request.file_search.is_some();

        tracing::info!(
            agent_id = %agent.id,
            model = %request.model,
            provider = self.provider.name(),
            indexed_files,
            file_search_enabled,
            "Testando agente de IA"
        );

        let started = Instant::now();
        let result = self.provider.generate(&api_key, &request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            agent_id = %agent.id,
            latency_ms,
            tool_calls = result.tool_calls_count,
            steps = result.steps_count,
            "Resposta do agente gerada"
        );

        Ok(TestAgentResponse {
            response: result.text,
            latency_ms,
            model: agent.model.clone(),
            knowledge_files_used: indexed_files,
            file_search_enabled,
            sources: Some(result.sources).filter(|s| !s.is_empty()),
            tool_calls_count: result.tool_calls_count,
            steps_count: result.steps_count,
            grounding_metadata: result.grounding_metadata,
            usage: result.usage,
        })
    }
}

/// Monta a chamada ao provedor. A busca em arquivos só entra quando o agente
/// tem um store e pelo menos um documento indexado.
pub fn build_request(agent: &AiAgent, indexed_files: i64, message: &str) -> GenerationRequest {
    let store = agent
        .file_search_store_id
        .as_deref()
        .filter(|s| !s.is_empty() && indexed_files > 0);

    let system = match store {
        Some(_) => format!(
            "{}\n\n{}",
            agent.system_prompt,
            knowledge_base_instructions(indexed_files)
        ),
        None => agent.system_prompt.clone(),
    };

    GenerationRequest {
        model: agent.model_or_default().to_string(),
        system,
        prompt: message.to_string(),
        temperature: agent.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_output_tokens: agent.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        file_search: store.map(|name| FileSearchTool {
            store_name: name.to_string(),
            top_k: FILE_SEARCH_TOP_K,
        }),
        max_steps: if store.is_some() { FILE_SEARCH_MAX_STEPS } else { 1 },
    }
}

fn knowledge_base_instructions(indexed_files: i64) -> String {
    format!(
        "## INSTRUÇÕES SOBRE BASE DE CONHECIMENTO\n\
         Você tem acesso a uma base de conhecimento com {indexed_files} documento(s) indexado(s).\n\
         Use a ferramenta de busca (file_search) para encontrar informações relevantes antes de responder.\n\
         Se a resposta não estiver na base de conhecimento, diga que não tem essa informação disponível.\n\
         Sempre cite a fonte quando usar informações da base de conhecimento."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn agent(store: Option<&str>) -> AiAgent {
        AiAgent {
            id: Uuid::new_v4(),
            name: "Atendente".into(),
            system_prompt: "Você é um atendente.".into(),
            model: None,
            temperature: None,
            max_tokens: Some(512),
            file_search_store_id: store.map(String::from),
            is_active: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn plain_request_without_store() {
        let req = build_request(&agent(None), 3, "Oi");
        assert_eq!(req.model, "gemini-2.0-flash");
        assert_eq!(req.system, "Você é um atendente.");
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_output_tokens, 512);
        assert!(req.file_search.is_none());
        assert_eq!(req.max_steps, 1);
    }

    #[test]
    fn store_without_indexed_files_disables_search() {
        let req = build_request(&agent(Some("fileSearchStores/abc")), 0, "Oi");
        assert!(req.file_search.is_none());
        assert!(!req.system.contains("BASE DE CONHECIMENTO"));
    }

    #[test]
    fn store_with_files_binds_file_search() {
        let req = build_request(&agent(Some("fileSearchStores/abc")), 2, "Oi");
        assert_eq!(
            req.file_search,
            Some(FileSearchTool { store_name: "fileSearchStores/abc".into(), top_k: 5 })
        );
        assert_eq!(req.max_steps, 5);
        assert!(req.system.starts_with("Você é um atendente.\n\n## INSTRUÇÕES SOBRE BASE DE CONHECIMENTO"));
        assert!(req.system.contains("com 2 documento(s) indexado(s)"));
    }
}
