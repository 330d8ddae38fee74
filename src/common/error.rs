use std::collections::HashMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    services::{generative::ProviderError, whatsapp::WhatsAppError},
};

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(String),

    #[error("Agente não encontrado")]
    AgentNotFound,

    #[error("Flow não encontrado")]
    FlowNotFound,

    #[error("Nó não encontrado: {0}")]
    FlowNodeNotFound(String),

    #[error("Conexão inválida: {0}")]
    InvalidFlowEdge(String),

    #[error("API key do Gemini não configurada")]
    AiKeyNotConfigured,

    #[error("Erro do provedor de IA: {0}")]
    Provider(#[from] ProviderError),

    #[error("Credenciais do WhatsApp não configuradas")]
    WhatsAppNotConfigured,

    #[error("Erro do WhatsApp: {0}")]
    WhatsApp(#[from] WhatsAppError),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

// JSON malformado vira 400 (e não o 422 padrão do axum)
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

/// O que de fato vai para o cliente: status + mensagem já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidBody(_) | AppError::InvalidFlowEdge(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AgentNotFound | AppError::FlowNotFound | AppError::FlowNodeNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Provider(ProviderError::AuthFailed(_)) => StatusCode::UNAUTHORIZED,
            AppError::Provider(ProviderError::RateLimited(_))
            | AppError::Provider(ProviderError::QuotaExceeded(_)) => StatusCode::TOO_MANY_REQUESTS,
            AppError::WhatsApp(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();

        let message = match &self {
            AppError::ValidationError(errors) => {
                // Retorna todos os detalhes da validação, já traduzidos.
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            store.translate(lang, code)
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status,
                    message: store.translate(lang, "invalid_request"),
                    details: Some(json!(details)),
                };
            }
            AppError::InvalidBody(detail) => store.translate_with(lang, "invalid_json", detail),
            AppError::AgentNotFound => store.translate(lang, "agent_not_found"),
            AppError::FlowNotFound => store.translate(lang, "flow_not_found"),
            AppError::FlowNodeNotFound(id) => store.translate_with(lang, "flow_node_not_found", id),
            AppError::InvalidFlowEdge(detail) => store.translate_with(lang, "invalid_flow_edge", detail),
            AppError::AiKeyNotConfigured => store.translate(lang, "ai_key_missing"),
            AppError::Provider(ProviderError::AuthFailed(_)) => store.translate(lang, "ai_auth_error"),
            AppError::Provider(ProviderError::RateLimited(_)) => store.translate(lang, "ai_rate_limited"),
            AppError::Provider(ProviderError::QuotaExceeded(_)) => store.translate(lang, "ai_quota_exceeded"),
            AppError::Provider(e) => {
                tracing::error!("Erro do provedor de IA: {}", e);
                store.translate_with(lang, "ai_agent_test_failed", &e.to_string())
            }
            AppError::WhatsAppNotConfigured => store.translate(lang, "whatsapp_not_configured"),
            AppError::WhatsApp(e) => {
                tracing::warn!("Envio rejeitado pelo WhatsApp: {}", e);
                store.translate_with(lang, "whatsapp_send_failed", &e.to_string())
            }

            // DatabaseError, InternalServerError viram 500 genérico.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                store.translate(lang, "internal_error")
            }
        };

        ApiError { status, message, details: None }
    }
}
