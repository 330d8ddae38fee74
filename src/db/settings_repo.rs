// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;

// Chaves conhecidas da tabela `settings`
pub const GEMINI_API_KEY: &str = "gemini_api_key";
pub const WHATSAPP_PHONE_NUMBER_ID: &str = "whatsapp_phone_number_id";
pub const WHATSAPP_ACCESS_TOKEN: &str = "whatsapp_access_token";
pub const TEST_CONTACT_PHONE: &str = "test_contact_phone";

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Valor de uma chave. Vazio conta como ausente.
    pub async fn get_value<'e, E>(&self, executor: E, key: &str) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
                .bind(key)
                .fetch_optional(executor)
                .await?;

        Ok(value.flatten().filter(|v| !v.trim().is_empty()))
    }
}
