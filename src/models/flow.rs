// src/models/flow.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const FLOW_SPEC_VERSION: i64 = 1;

// --- DOCUMENTO DO FLOW (mapa de nós e conexões) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlowNodeKind {
    Message,
    End,
}

impl FlowNodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowNodeKind::Message => "message",
            FlowNodeKind::End => "end",
        }
    }
}

// Formato genérico do editor de grafos. Campos desconhecidos (width, selected...)
// são preservados em `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub data: Value,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FlowSpec {
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl Default for FlowSpec {
    fn default() -> Self {
        Self {
            version: FLOW_SPEC_VERSION,
            viewport: Some(Viewport::default()),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

// --- RASCUNHO PERSISTIDO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowRow {
    pub id: Uuid,
    #[schema(example = "Cadastro de leads")]
    pub name: String,
    #[schema(example = "DRAFT")]
    pub status: String,
    pub meta_flow_id: Option<String>,
    // JSONB opaco; normalizado na leitura
    #[schema(value_type = Object)]
    pub spec: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- PAYLOADS DO EDITOR ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFlowPayload {
    #[validate(length(min = 1, max = 120, message = "invalid_name"))]
    #[schema(example = "Cadastro de leads")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlowPayload {
    #[validate(length(min = 1, max = 120, message = "invalid_name"))]
    pub name: Option<String>,
    pub meta_flow_id: Option<String>,
    // Aceita qualquer formato; é normalizado antes de salvar
    #[schema(value_type = Option<Object>)]
    pub spec: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddNodePayload {
    #[serde(rename = "type")]
    pub kind: FlowNodeKind,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectNodesPayload {
    pub source: String,
    pub target: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct FlowListQuery {
    // Filtro por nome (contém, sem diferenciar maiúsculas)
    pub search: Option<String>,
}

// --- ENVIO DE FLOW ---

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    #[default]
    Navigate,
    DataExchange,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendFlowRequest {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "+5511999998888")]
    pub to: String,
    // ID do Flow publicado na Meta
    #[validate(length(min = 1, message = "required"))]
    pub flow_id: String,
    #[validate(length(min = 1, message = "required"))]
    pub flow_token: String,
    pub body: Option<String>,
    pub cta_text: Option<String>,
    pub footer: Option<String>,
    pub action: Option<FlowAction>,
    #[schema(value_type = Option<Object>)]
    pub action_payload: Option<Value>,
    #[schema(example = "3")]
    pub flow_message_version: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendFlowResponse {
    pub success: bool,
    pub message_id: Option<String>,
}
