// src/db/campaign_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dashboard::{Campaign, CampaignFolder, DashboardStatsRaw},
};

const CAMPAIGN_COLUMNS: &str =
    "id, name, status, template_name, folder_id, recipients, sent, delivered, read, failed, created_at";

/// Filtro de pasta da listagem de campanhas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderFilter {
    #[default]
    Any,
    // Campanhas sem pasta
    Unfiled,
    Folder(Uuid),
}

#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Números do painel numa única query agregada.
    pub async fn get_dashboard_stats<'e, E>(&self, executor: E) -> Result<DashboardStatsRaw, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, DashboardStatsRaw>(
            r#"
            SELECT
                COALESCE(SUM(sent), 0)::BIGINT AS total_sent,
                COALESCE(SUM(delivered), 0)::BIGINT AS total_delivered,
                COALESCE(SUM(read), 0)::BIGINT AS total_read,
                COALESCE(SUM(failed), 0)::BIGINT AS total_failed,
                COUNT(*) FILTER (WHERE status IN ('SENDING', 'SCHEDULED'))::BIGINT AS active_campaigns,
                CASE WHEN COALESCE(SUM(sent), 0) = 0 THEN 0::FLOAT8
                     ELSE ROUND((SUM(delivered)::NUMERIC * 100) / SUM(sent), 1)::FLOAT8
                END AS delivery_rate
            FROM campaigns
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(stats)
    }

    /// Mais recentes primeiro.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        folder: FolderFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Campaign>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (unfiled, folder_id) = match folder {
            FolderFilter::Any => (false, None),
            FolderFilter::Unfiled => (true, None),
            FolderFilter::Folder(id) => (false, Some(id)),
        };

        let sql = format!(
            r#"
            SELECT {CAMPAIGN_COLUMNS}
            FROM campaigns
            WHERE ($1 = FALSE OR folder_id IS NULL)
              AND ($2::UUID IS NULL OR folder_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        );
        let campaigns = sqlx::query_as::<_, Campaign>(&sql)
            .bind(unfiled)
            .bind(folder_id)
            .bind(limit)
            .fetch_all(executor)
            .await?;

        Ok(campaigns)
    }

    pub async fn list_folders<'e, E>(&self, executor: E) -> Result<Vec<CampaignFolder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let folders = sqlx::query_as::<_, CampaignFolder>(
            r#"
            SELECT f.id, f.name, f.color, COUNT(c.id)::BIGINT AS campaign_count
            FROM campaign_folders f
            LEFT JOIN campaigns c ON c.folder_id = f.id
            GROUP BY f.id, f.name, f.color
            ORDER BY f.name ASC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(folders)
    }

    /// (total, sem pasta)
    pub async fn count_campaigns<'e, E>(&self, executor: E) -> Result<(i64, i64), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::BIGINT, COUNT(*) FILTER (WHERE folder_id IS NULL)::BIGINT
            FROM campaigns
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(counts)
    }
}
