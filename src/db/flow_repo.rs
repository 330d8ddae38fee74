// src/db/flow_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::flow::FlowRow};

const FLOW_COLUMNS: &str = "id, name, status, meta_flow_id, spec, created_at, updated_at";

#[derive(Clone)]
pub struct FlowRepository {
    pool: PgPool,
}

impl FlowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mais recentes primeiro; `search` filtra pelo nome (ILIKE).
    pub async fn list<'e, E>(&self, executor: E, search: Option<&str>) -> Result<Vec<FlowRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let sql = format!(
            "SELECT {FLOW_COLUMNS} FROM flows WHERE ($1::TEXT IS NULL OR name ILIKE $1) ORDER BY updated_at DESC"
        );
        let flows = sqlx::query_as::<_, FlowRow>(&sql)
            .bind(pattern)
            .fetch_all(executor)
            .await?;

        Ok(flows)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<FlowRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {FLOW_COLUMNS} FROM flows WHERE id = $1");
        let flow = sqlx::query_as::<_, FlowRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(flow)
    }

    /// Igual a `find_by_id`, mas trava a linha até o fim da transação.
    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<FlowRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let flow = sqlx::query_as::<_, FlowRow>(&lock_flow_sql())
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(flow)
    }

    pub async fn create<'e, E>(&self, executor: E, name: &str, spec: &Value) -> Result<FlowRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO flows (name, spec) VALUES ($1, $2) RETURNING {FLOW_COLUMNS}"
        );
        let flow = sqlx::query_as::<_, FlowRow>(&sql)
            .bind(name)
            .bind(spec)
            .fetch_one(executor)
            .await?;

        Ok(flow)
    }

    /// Atualização parcial: campos `None` mantêm o valor atual.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        meta_flow_id: Option<&str>,
        spec: Option<&Value>,
    ) -> Result<Option<FlowRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE flows SET
                name = COALESCE($2, name),
                meta_flow_id = COALESCE($3, meta_flow_id),
                spec = COALESCE($4, spec),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {FLOW_COLUMNS}
            "#
        );
        let flow = sqlx::query_as::<_, FlowRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(meta_flow_id)
            .bind(spec)
            .fetch_optional(executor)
            .await?;

        Ok(flow)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM flows WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn lock_flow_sql() -> String {
    format!("SELECT {FLOW_COLUMNS} FROM flows WHERE id = $1 FOR UPDATE")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_load_locks_the_row() {
        let sql = lock_flow_sql();
        assert!(sql.starts_with("SELECT id, name, status, meta_flow_id, spec"));
        assert!(sql.ends_with("WHERE id = $1 FOR UPDATE"));
    }
}
