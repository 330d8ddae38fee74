pub mod ai_agent;
pub mod audience;
pub mod contact;
pub mod dashboard;
pub mod flow;
