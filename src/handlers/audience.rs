// src/handlers/audience.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::audience::{AudiencePreview, AudiencePreviewRequest},
    services::audience_wizard::{WizardRequest, WizardResponse},
};

// POST /api/campaigns/audience/preview
#[utoipa::path(
    post,
    path = "/api/campaigns/audience/preview",
    tag = "Audience",
    request_body = AudiencePreviewRequest,
    responses(
        (status = 200, description = "Elegíveis e contagens por tag, DDI, UF e campo", body = AudiencePreview),
        (status = 400, description = "Critérios inválidos")
    )
)]
pub async fn preview(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<AudiencePreviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    let preview = app_state.audience_service
        .preview_for(&app_state.db_pool, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(preview)))
}

// POST /api/campaigns/audience/wizard
#[utoipa::path(
    post,
    path = "/api/campaigns/audience/wizard",
    tag = "Audience",
    request_body = WizardRequest,
    responses(
        (status = 200, description = "Novo estado do passo Público com prévia, custo e limite", body = WizardResponse),
        (status = 400, description = "Estado ou ação inválidos")
    )
)]
pub async fn wizard(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<WizardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state.audience_service
        .wizard_step(&app_state.db_pool, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}
