mod config;
mod conversation;
mod errors;
mod extract;
mod formatter;
mod interview;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::conversation::store::{ConversationStore, InMemoryConversationStore};
use crate::interview::{prompts::default_seed, InterviewCoach};
use crate::llm_client::{ChatModel, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

/// Upper bound on how often idle sessions are swept.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Coach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client. A missing key is not fatal: chat answers NotConfigured.
    let model: Option<Arc<dyn ChatModel>> = match LlmClient::from_config(&config)? {
        Some(client) => {
            info!(
                "LLM client initialized (model: {}, streaming: {})",
                client.model(),
                client.is_streaming()
            );
            Some(Arc::new(client))
        }
        None => {
            warn!("GROQ_API_KEY is not set; /api/chat will answer NOT_CONFIGURED");
            None
        }
    };

    let store: Arc<dyn ConversationStore> =
        Arc::new(InMemoryConversationStore::new(default_seed()));

    let coach = Arc::new(InterviewCoach::new(store, model));

    match config.session_ttl {
        Some(ttl) => spawn_session_sweeper(coach.store().clone(), ttl),
        None => info!("Session eviction disabled (SESSION_TTL_SECS=0)"),
    }

    let state = AppState {
        coach,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically evicts sessions idle for longer than `ttl`.
fn spawn_session_sweeper(store: Arc<dyn ConversationStore>, ttl: Duration) {
    let period = ttl.min(MAX_SWEEP_INTERVAL);
    info!("Evicting sessions idle for {}s (sweep every {}s)", ttl.as_secs(), period.as_secs());

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = store.evict_idle(ttl).await;
            if evicted > 0 {
                info!(
                    "Evicted {evicted} idle sessions ({} remaining)",
                    store.session_count().await
                );
            }
        }
    });
}
