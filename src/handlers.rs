pub mod ai_agents;
pub mod audience;
pub mod campaigns;
pub mod dashboard;
pub mod flows;
pub mod installer;
