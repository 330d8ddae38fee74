// src/models/dashboard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// 1. Agregado vindo de uma única query
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsRaw {
    pub total_sent: i64,
    pub total_delivered: i64,
    pub total_read: i64,
    pub total_failed: i64,
    pub active_campaigns: i64,
    // Percentual com uma casa decimal (ex: 97.5)
    pub delivery_rate: f64,
}

// 2. Campanhas
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    #[schema(example = "Black Friday")]
    pub name: Option<String>,
    #[schema(example = "SENT")]
    pub status: String,
    pub template_name: Option<String>,
    pub folder_id: Option<Uuid>,
    pub recipients: i64,
    pub sent: i64,
    pub delivered: i64,
    pub read: i64,
    pub failed: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignFolder {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub campaign_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignFoldersResponse {
    pub folders: Vec<CampaignFolder>,
    pub total_count: i64,
    pub unfiled_count: i64,
}

// 3. Cards e gráfico do painel (valores já formatados)
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct ChartDataPoint {
    pub name: String,
    pub sent: i64,
    pub read: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[schema(example = "12.480")]
    pub sent24h: String,
    #[schema(example = "97.5%")]
    pub delivery_rate: String,
    pub active_campaigns: String,
    pub failed_messages: String,
    pub chart_data: Vec<ChartDataPoint>,
}
