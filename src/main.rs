use std::sync::Arc;

use strokesense::config;
use strokesense::engine::EngineState;
use strokesense::pipeline::orchestrator::OrchestratorConfig;
use strokesense::pipeline::retrieval::{
    EmbeddingGenerator, HttpEmbedder, InMemorySimilarityIndex, SimilarityIndex,
    EMBEDDING_DIM,
};
use strokesense::trigger::{AlertTrigger, LogAlertTrigger, WebhookAlertTrigger};

#[tokio::main]
async fn main() {
    strokesense::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let orchestrator_config = OrchestratorConfig {
        top_k: config::DEFAULT_TOP_K,
        retrieval_timeout: config::DEFAULT_RETRIEVAL_TIMEOUT,
        retrieval_enabled: true,
    };

    let artifact_path = config::artifact_path();
    let engine = match config::embed_service_url() {
        Some(url) => {
            let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(HttpEmbedder::new(
                &url,
                &config::embed_model(),
                EMBEDDING_DIM,
                10,
            ));
            let index: Arc<dyn SimilarityIndex> = Arc::new(InMemorySimilarityIndex::new(
                embedder.dimension(),
                embedder.version(),
            ));
            EngineState::load_with(&artifact_path, orchestrator_config, embedder, index)
        }
        None => EngineState::load(&artifact_path, orchestrator_config),
    };

    let engine = match engine {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::error!(
                artifact = %artifact_path.display(),
                error = %e,
                "engine failed to load, refusing to serve"
            );
            std::process::exit(1);
        }
    };

    let trigger: Arc<dyn AlertTrigger> = match config::alert_webhook_url() {
        Some(url) => Arc::new(WebhookAlertTrigger::new(&url, 5)),
        None => Arc::new(LogAlertTrigger),
    };

    let app = strokesense::api::router::api_router(strokesense::api::types::ApiContext::new(
        engine, trigger,
    ));

    let addr = config::bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind listener");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %addr, "listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
