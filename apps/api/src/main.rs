mod analysis;
mod config;
mod errors;
mod extract;
mod llm_client;
mod report;
mod routes;
mod session;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::prompts::CCTP_ANALYSIS;
use crate::config::Config;
use crate::extract::PdfTextExtractor;
use crate::llm_client::GeminiClient;
use crate::report::ReportTemplate;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memoire API v{}", env!("CARGO_PKG_VERSION"));

    if config.access_password.is_none() {
        warn!("ADMIN_PASSWORD is not set: every login will fail with a configuration error");
    }
    if config.google_api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set: every analysis will fail with a configuration error");
    }

    let gemini = GeminiClient::new(
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_api_base.clone(),
    )?;
    info!("LLM client initialized (model: {})", gemini.model());
    info!(
        "Quota: {} analyses per session, minimum text length {} characters",
        config.quota_max, config.min_text_chars
    );

    let state = AppState {
        sessions: SessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
            config.max_sessions,
        ),
        extractor: Arc::new(PdfTextExtractor),
        analyzer: Arc::new(gemini),
        prompt: CCTP_ANALYSIS,
        report: ReportTemplate::default(),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
