//! HTTP server for lensd.

use crate::routes;
use anyhow::Result;
use axum::Router;
use lens_common::{
    AnswerScorer, HttpInferenceClient, InferenceClient, LensConfig, PersonaChat, PersonaExtractor,
    PersonaPanel, PersonaStore,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
pub struct AppState {
    pub store: Arc<PersonaStore>,
    pub extractor: PersonaExtractor,
    pub chat: PersonaChat,
    pub panel: PersonaPanel,
    pub scorer: AnswerScorer,
    pub config: LensConfig,
    pub start_time: Instant,
}

impl AppState {
    /// Build production state: SQLite store plus the HTTP inference client.
    pub fn new(config: LensConfig) -> Result<Self> {
        let store = Arc::new(PersonaStore::open(&config.storage.resolved_db_path())?);
        let client: Arc<dyn InferenceClient> = Arc::new(HttpInferenceClient::new(
            config.inference.to_inference_config(),
        )?);
        Ok(Self::with_parts(store, client, config))
    }

    /// Assemble state from explicit parts. Tests inject an in-memory store
    /// and a fake inference client here.
    pub fn with_parts(
        store: Arc<PersonaStore>,
        client: Arc<dyn InferenceClient>,
        config: LensConfig,
    ) -> Self {
        Self {
            store,
            extractor: PersonaExtractor::new(client.clone()),
            chat: PersonaChat::new(client.clone()),
            panel: PersonaPanel::new(client.clone()),
            scorer: AnswerScorer::new(client),
            config,
            start_time: Instant::now(),
        }
    }
}

/// Build the full router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::stats_routes())
        .merge(routes::interview_routes())
        .merge(routes::persona_routes())
        .merge(routes::chat_routes())
        .merge(routes::admin_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server.
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let state = Arc::new(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
