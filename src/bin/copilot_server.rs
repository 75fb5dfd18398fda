//! Live-call copilot server.
//!
//! Usage: `copilot-server [config.toml]`. Without an argument the default
//! config path is used, falling back to built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use recruiter_copilot::config::CopilotConfig;
use recruiter_copilot::conversation::LlmGenerator;
use recruiter_copilot::server::{AppState, CopilotServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(CopilotConfig::default_config_path);
    let mut config = CopilotConfig::load_or_default(&path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?;
    config.apply_env_overrides();
    config.validate()?;

    if config.llm.api_key.is_empty() {
        tracing::warn!("no API key configured; set COPILOT_API_KEY or GROQ_API_KEY");
    }
    tracing::info!(model = %config.llm.model, api_url = %config.llm.api_url, "copilot starting");

    let generator = Arc::new(LlmGenerator::from_config(&config.llm));
    let bind = config.server.bind.clone();
    let server = CopilotServer::start(AppState::new(config, generator), &bind).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    server.shutdown().await;
    Ok(())
}
