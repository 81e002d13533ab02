pub mod changelog;
pub mod handlers;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod sanitize;
