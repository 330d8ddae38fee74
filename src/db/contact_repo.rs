// src/db/contact_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::contact::{Contact, CustomFieldDefinition},
};

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lista completa; a filtragem acontece em memória no serviço de público.
    pub async fn list_contacts<'e, E>(&self, executor: E) -> Result<Vec<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, phone, email, status, tags, custom_fields, created_at
            FROM contacts
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(contacts)
    }

    pub async fn list_custom_field_definitions<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<CustomFieldDefinition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let definitions = sqlx::query_as::<_, CustomFieldDefinition>(
            r#"
            SELECT id, key, label, entity_type, created_at
            FROM custom_field_definitions
            WHERE entity_type = 'contact'
            ORDER BY label ASC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(definitions)
    }
}
