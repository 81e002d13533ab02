mod coach;
mod config;
mod errors;
mod llm_client;
mod matching;
mod routes;
mod state;
mod tailoring;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{DisabledGenerator, Generator, OpenAiClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the generation service, or a stand-in that always fails
    let generator: Arc<dyn Generator> = match OpenAiClient::from_config(&config)? {
        Some(client) => {
            info!(
                "LLM client initialized (model: {}, timeout: {:?})",
                client.model(),
                config.llm_timeout
            );
            Arc::new(client)
        }
        None => {
            warn!("OPENAI_API_KEY not set; rewrites will fail and actions use templates");
            Arc::new(DisabledGenerator)
        }
    };

    let state = AppState {
        config: config.clone(),
        generator,
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
