// src/models/contact.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value; // <--- Campos personalizados ficam em JSONB
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE contact_status do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "contact_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    OptIn,
    OptOut,
    Unknown,
}

// --- CONTATO (O Dado) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,

    #[schema(example = "Maria da Silva")]
    pub name: Option<String>,

    // Telefone no formato E.164 (com ou sem '+')
    #[schema(example = "+5511999998888")]
    pub phone: String,

    pub email: Option<String>,

    pub status: ContactStatus,

    // No Postgres é TEXT[], no Rust é Vec<String>
    #[serde(default)]
    #[schema(example = json!(["vip", "2024"]))]
    pub tags: Vec<String>,

    // Ex: { "cidade": "Campinas", "plano": "ouro" }
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"plano": "ouro"}))]
    pub custom_fields: Value,

    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn custom_field(&self, key: &str) -> Option<&Value> {
        self.custom_fields.as_object().and_then(|obj| obj.get(key))
    }

    pub fn is_opted_out(&self) -> bool {
        self.status == ContactStatus::OptOut
    }
}

// --- DEFINIÇÕES (O Molde) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldDefinition {
    pub id: Uuid,

    #[schema(example = "plano")]
    pub key: String,

    #[schema(example = "Plano contratado")]
    pub label: String,

    // Hoje só existe "contact", mas o schema já permite outras entidades
    #[schema(example = "contact")]
    pub entity_type: String,

    pub created_at: DateTime<Utc>,
}
