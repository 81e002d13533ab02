use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::Generator;
use crate::tailoring::pipeline::PipelineSettings;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Generation capability. `DisabledGenerator` when no API key is configured.
    pub generator: Arc<dyn Generator>,
}

impl AppState {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings::from_config(&self.config)
    }
}
