// src/handlers/campaigns.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    db::FolderFilter,
    middleware::i18n::Locale,
    models::dashboard::{Campaign, CampaignFoldersResponse},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CampaignListQuery {
    /// UUID da pasta, ou `none` para campanhas sem pasta
    pub folder: Option<String>,
}

impl CampaignListQuery {
    // Valor desconhecido é ignorado (lista tudo)
    fn folder_filter(&self) -> FolderFilter {
        match self.folder.as_deref().map(str::trim) {
            Some("none") => FolderFilter::Unfiled,
            Some(raw) => Uuid::parse_str(raw).map_or(FolderFilter::Any, FolderFilter::Folder),
            None => FolderFilter::Any,
        }
    }
}

// GET /api/campaigns
#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Campaigns",
    params(CampaignListQuery),
    responses(
        (status = 200, description = "Campanhas, mais recentes primeiro", body = Vec<Campaign>)
    )
)]
pub async fn list_campaigns(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<CampaignListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let campaigns = app_state.dashboard_service
        .list_campaigns(&app_state.db_pool, query.folder_filter())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(campaigns)))
}

// GET /api/campaigns/folders
#[utoipa::path(
    get,
    path = "/api/campaigns/folders",
    tag = "Campaigns",
    responses(
        (status = 200, description = "Pastas com contagem de campanhas", body = CampaignFoldersResponse)
    )
)]
pub async fn list_folders(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let folders = app_state.dashboard_service
        .list_folders(&app_state.db_pool)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(folders)))
}
