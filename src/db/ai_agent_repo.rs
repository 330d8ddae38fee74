// src/db/ai_agent_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::ai_agent::AiAgent};

#[derive(Clone)]
pub struct AiAgentRepository {
    pool: PgPool,
}

impl AiAgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<AiAgent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agent = sqlx::query_as::<_, AiAgent>(
            r#"
            SELECT id, name, system_prompt, model, temperature, max_tokens,
                   file_search_store_id, is_active, created_at
            FROM ai_agents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(agent)
    }

    /// Documentos do agente que já terminaram a indexação.
    pub async fn count_indexed_files<'e, E>(&self, executor: E, agent_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM ai_knowledge_files
            WHERE agent_id = $1 AND indexing_status = 'completed'
            "#,
        )
        .bind(agent_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }
}
