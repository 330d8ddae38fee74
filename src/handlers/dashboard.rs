// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::dashboard::{Campaign, DashboardStatsRaw, DashboardSummary},
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Totais de envio agregados numa única query", body = DashboardStatsRaw)
    )
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state.dashboard_service
        .get_stats(&app_state.db_pool)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Cards e gráfico do painel (nunca falha; lados indisponíveis vêm zerados)", body = DashboardSummary)
    )
)]
pub async fn get_summary(State(app_state): State<AppState>) -> impl IntoResponse {
    let summary = app_state.dashboard_service.get_summary(&app_state.db_pool).await;
    (StatusCode::OK, Json(summary))
}

// GET /api/dashboard/recent-campaigns
#[utoipa::path(
    get,
    path = "/api/dashboard/recent-campaigns",
    tag = "Dashboard",
    responses(
        (status = 200, description = "As 5 campanhas mais recentes", body = Vec<Campaign>)
    )
)]
pub async fn get_recent_campaigns(State(app_state): State<AppState>) -> impl IntoResponse {
    let campaigns = app_state.dashboard_service.recent_campaigns(&app_state.db_pool).await;
    (StatusCode::OK, Json(campaigns))
}
