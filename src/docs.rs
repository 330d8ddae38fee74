// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Audience ---
        handlers::audience::preview,
        handlers::audience::wizard,

        // --- Campaigns ---
        handlers::campaigns::list_campaigns,
        handlers::campaigns::list_folders,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_summary,
        handlers::dashboard::get_recent_campaigns,

        // --- AI Agents ---
        handlers::ai_agents::test_agent,

        // --- Flows ---
        handlers::flows::list_flows,
        handlers::flows::create_flow,
        handlers::flows::get_flow,
        handlers::flows::update_flow,
        handlers::flows::delete_flow,
        handlers::flows::add_node,
        handlers::flows::update_node,
        handlers::flows::connect_nodes,
        handlers::flows::send_flow,

        // --- Installer ---
        handlers::installer::github_oauth_callback,
    ),
    components(
        schemas(
            // --- CONTATOS E PÚBLICO ---
            models::contact::ContactStatus,
            models::contact::Contact,
            models::contact::CustomFieldDefinition,
            models::audience::StatusFilter,
            models::audience::CustomFieldPredicate,
            models::audience::Refinement,
            models::audience::AudienceCriteria,
            models::audience::AudiencePreset,
            models::audience::TagCount,
            models::audience::DdiCount,
            models::audience::UfCount,
            models::audience::CustomFieldCount,
            models::audience::AudienceStats,
            models::audience::AudiencePreview,
            models::audience::AudiencePreviewRequest,

            // --- ASSISTENTE E CUSTO ---
            services::audience_wizard::RecipientSource,
            services::audience_wizard::WizardState,
            services::audience_wizard::WizardAction,
            services::audience_wizard::WizardRequest,
            services::audience_wizard::WizardResponse,
            services::pricing::MessageCategory,
            services::pricing::PricingBreakdown,
            services::pricing::LimitCheck,

            // --- DASHBOARD ---
            models::dashboard::DashboardStatsRaw,
            models::dashboard::Campaign,
            models::dashboard::CampaignFolder,
            models::dashboard::CampaignFoldersResponse,
            models::dashboard::ChartDataPoint,
            models::dashboard::DashboardSummary,

            // --- AI AGENTS ---
            models::ai_agent::AiAgent,
            models::ai_agent::TestAgentPayload,
            models::ai_agent::TestAgentResponse,
            models::ai_agent::SourceRef,
            models::ai_agent::TokenUsage,

            // --- FLOWS ---
            models::flow::Viewport,
            models::flow::Position,
            models::flow::FlowNodeKind,
            models::flow::FlowNode,
            models::flow::FlowEdge,
            models::flow::FlowSpec,
            models::flow::FlowRow,
            models::flow::CreateFlowPayload,
            models::flow::UpdateFlowPayload,
            models::flow::AddNodePayload,
            models::flow::ConnectNodesPayload,
            models::flow::FlowAction,
            models::flow::SendFlowRequest,
            models::flow::SendFlowResponse,
        )
    ),
    tags(
        (name = "Audience", description = "Público da campanha: elegibilidade, segmentos e assistente"),
        (name = "Campaigns", description = "Campanhas e pastas"),
        (name = "Dashboard", description = "Indicadores do painel"),
        (name = "AI Agents", description = "Teste de agentes de IA com base de conhecimento"),
        (name = "Flows", description = "Rascunhos de WhatsApp Flows e envio"),
        (name = "Installer", description = "Integração com GitHub durante a instalação")
    )
)]
pub struct ApiDoc;
