// src/handlers/ai_agents.rs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::ai_agent::{TestAgentPayload, TestAgentResponse},
};

// POST /api/ai-agents/{id}/test
#[utoipa::path(
    post,
    path = "/api/ai-agents/{id}/test",
    tag = "AI Agents",
    request_body = TestAgentPayload,
    params(
        ("id" = String, Path, description = "ID do agente")
    ),
    responses(
        (status = 200, description = "Resposta gerada pelo agente", body = TestAgentResponse),
        (status = 400, description = "Mensagem inválida"),
        (status = 401, description = "API key rejeitada pelo provedor"),
        (status = 404, description = "Agente não encontrado"),
        (status = 429, description = "Limite de requisições ou quota excedida"),
        (status = 500, description = "API key ausente ou erro do provedor")
    )
)]
pub async fn test_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(agent_id): Path<String>,
    payload: Result<Json<TestAgentPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state.ai_agent_service
        .test_agent(&app_state.db_pool, &agent_id, &payload.message)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}
