// src/services/dashboard_service.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{CampaignRepository, FolderFilter},
    models::dashboard::{
        Campaign, CampaignFoldersResponse, ChartDataPoint, DashboardStatsRaw, DashboardSummary,
    },
    services::pricing::group_thousands,
};

const CHART_CAMPAIGNS: usize = 7;
const RECENT_CAMPAIGNS: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    repo: CampaignRepository,
}

impl DashboardService {
    pub fn new(repo: CampaignRepository) -> Self {
        Self { repo }
    }

    pub async fn get_stats<'e, E>(&self, executor: E) -> Result<DashboardStatsRaw, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_dashboard_stats(executor).await
    }

    pub async fn list_campaigns<'e, E>(&self, executor: E, folder: FolderFilter) -> Result<Vec<Campaign>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, folder, None).await
    }

    /// Busca estatísticas e campanhas em paralelo e monta os cards do painel.
    /// Se um dos lados falhar, ele entra zerado (o painel nunca quebra).
    pub async fn get_summary<'e, E>(&self, executor: E) -> DashboardSummary
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let (stats, campaigns) = tokio::join!(
            self.repo.get_dashboard_stats(executor),
            self.repo.list(executor, FolderFilter::Any, Some(CHART_CAMPAIGNS as i64)),
        );

        let stats = stats.unwrap_or_else(|e| {
            tracing::warn!("Estatísticas do painel indisponíveis: {}", e);
            DashboardStatsRaw::default()
        });
        let campaigns = campaigns.unwrap_or_else(|e| {
            tracing::warn!("Campanhas do painel indisponíveis: {}", e);
            Vec::new()
        });

        build_summary(&stats, &campaigns)
    }

    /// As 5 mais recentes; lista vazia em caso de erro.
    pub async fn recent_campaigns<'e, E>(&self, executor: E) -> Vec<Campaign>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .list(executor, FolderFilter::Any, Some(RECENT_CAMPAIGNS))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Campanhas recentes indisponíveis: {}", e);
                Vec::new()
            })
    }

    pub async fn list_folders<'e, E>(&self, executor: E) -> Result<CampaignFoldersResponse, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let folders = self.repo.list_folders(executor).await?;
        let (total_count, unfiled_count) = self.repo.count_campaigns(executor).await?;
        Ok(CampaignFoldersResponse { folders, total_count, unfiled_count })
    }
}

/// `campaigns` vem da mais recente para a mais antiga; o gráfico mostra em ordem cronológica.
pub fn build_summary(stats: &DashboardStatsRaw, campaigns: &[Campaign]) -> DashboardSummary {
    let chart_data = campaigns
        .iter()
        .take(CHART_CAMPAIGNS)
        .map(|c| ChartDataPoint {
            name: chart_label(c.name.as_deref()),
            sent: c.recipients,
            read: c.read,
        })
        .rev()
        .collect();

    DashboardSummary {
        sent24h: format_count(stats.total_sent),
        delivery_rate: format!("{}%", stats.delivery_rate),
        active_campaigns: stats.active_campaigns.to_string(),
        failed_messages: stats.total_failed.to_string(),
        chart_data,
    }
}

fn chart_label(name: Option<&str>) -> String {
    match name {
        Some(n) if !n.is_empty() => n.chars().take(3).collect(),
        _ => "?".to_string(),
    }
}

fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(&digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn campaign(name: Option<&str>, recipients: i64, read: i64) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            name: name.map(String::from),
            status: "COMPLETED".into(),
            template_name: None,
            folder_id: None,
            recipients,
            sent: recipients,
            delivered: recipients,
            read,
            failed: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_formats_cards() {
        let stats = DashboardStatsRaw {
            total_sent: 12480,
            total_delivered: 12168,
            total_read: 9000,
            total_failed: 42,
            active_campaigns: 3,
            delivery_rate: 97.5,
        };
        let summary = build_summary(&stats, &[]);
        assert_eq!(summary.sent24h, "12.480");
        assert_eq!(summary.delivery_rate, "97.5%");
        assert_eq!(summary.active_campaigns, "3");
        assert_eq!(summary.failed_messages, "42");
        assert!(summary.chart_data.is_empty());
    }

    #[test]
    fn chart_uses_seven_latest_in_chronological_order() {
        let names = ["Nona", "Oitava", "Sétima", "Sexta", "Quinta", "Quarta", "Terceira", "Segunda"];
        let mut campaigns: Vec<Campaign> = names.iter().map(|n| campaign(Some(n), 10, 5)).collect();
        campaigns.push(campaign(None, 1, 0));

        let summary = build_summary(&DashboardStatsRaw::default(), &campaigns);
        let labels: Vec<&str> = summary.chart_data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(labels, vec!["Ter", "Qua", "Qui", "Sex", "Sét", "Oit", "Non"]);
    }

    #[test]
    fn empty_name_becomes_question_mark() {
        let summary = build_summary(&DashboardStatsRaw::default(), &[campaign(Some(""), 3, 1)]);
        assert_eq!(summary.chart_data, vec![ChartDataPoint { name: "?".into(), sent: 3, read: 1 }]);
        assert_eq!(summary.sent24h, "0");
        assert_eq!(summary.delivery_rate, "0%");
    }
}
