pub mod ai_agent_repo;
pub use ai_agent_repo::AiAgentRepository;
pub mod campaign_repo;
pub use campaign_repo::{CampaignRepository, FolderFilter};
pub mod contact_repo;
pub use contact_repo::ContactRepository;
pub mod flow_repo;
pub use flow_repo::FlowRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
