pub mod ai_agent_service;
pub mod audience_service;
pub mod audience_wizard;
pub mod dashboard_service;
pub mod flow_builder;
pub mod flow_service;
pub mod gemini;
pub mod generative;
pub mod github_oauth;
pub mod phone;
pub mod pricing;
pub mod whatsapp;
