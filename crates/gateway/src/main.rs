//! Corpora API Gateway
//!
//! The entry point for all external API requests:
//! - Document upload, listing and conversion
//! - Translation job submission
//! - Knowledge-base lifecycle, search and chat
//! - Health reporting

mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
use corpora_common::config::AppConfig;
use corpora_common::db::{DbPool, Repository};
use corpora_common::jobs::JobService;
use corpora_common::llm::{LlmClient, OllamaClient};
use corpora_common::metrics;
use corpora_common::object_store::{ObjectStore, S3ObjectStore};
use corpora_common::queue::JobQueue;
use corpora_common::vector::{PgVectorStore, VectorStore};
use corpora_common::VERSION;
use corpora_ingestion::{ExtractorClient, IngestPipeline};
use corpora_knowledge::{ChatService, KnowledgeService};
use corpora_search::RetrievalEngine;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn, Level};

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Repository,
    pub store: Arc<dyn ObjectStore>,
    pub vector: Arc<dyn VectorStore>,
    pub llm: Arc<dyn LlmClient>,
    pub pipeline: Arc<IngestPipeline>,
    pub knowledge: Arc<KnowledgeService>,
    pub chat: Arc<ChatService>,
    pub jobs: Arc<JobService>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting Corpora API Gateway v{}", VERSION);

    let config = AppConfig::load().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    let config = Arc::new(config);

    metrics::register_metrics();

    info!("Connecting to database...");
    let db = DbPool::new(&config.postgres, &config.database_url()).await?;
    let repo = Repository::new(db.clone());

    let pg_vector = PgVectorStore::new(db);
    pg_vector.ensure_schema().await?;
    let vector: Arc<dyn VectorStore> = Arc::new(pg_vector);

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.object_store));
    store.ensure_bucket(&config.object_store.pdf_bucket).await?;
    store
        .ensure_bucket(&config.object_store.chunks_bucket)
        .await?;

    let llm: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(&config.llm));

    let extractor = ExtractorClient::new(&config.extractor);
    let pipeline = Arc::new(IngestPipeline::new(
        store.clone(),
        repo.clone(),
        extractor,
        config.object_store.chunks_bucket.clone(),
    ));

    let knowledge = Arc::new(KnowledgeService::new(
        repo.clone(),
        store.clone(),
        vector.clone(),
        llm.clone(),
        config.llm.default_embedding_model.clone(),
        config.llm.default_reasoning_model.clone(),
    ));

    let engine = Arc::new(RetrievalEngine::new(vector.clone(), llm.clone()));
    let chat = Arc::new(ChatService::new(repo.clone(), engine, llm.clone()));

    let queue = Arc::new(JobQueue::new(&config.queue).await?);
    let jobs = Arc::new(JobService::new(queue, repo.clone()));

    let state = AppState {
        config: config.clone(),
        repo,
        store,
        vector,
        llm,
        pipeline,
        knowledge,
        chat,
        jobs,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Close the listener on the signal, then give in-flight requests the
    // configured grace period before forcing shutdown.
    let shutdown = Arc::new(tokio::sync::Notify::new());
    let notify = shutdown.clone();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { notify.notified().await })
            .into_future(),
    );

    shutdown_signal().await;
    shutdown.notify_one();

    match tokio::time::timeout(config.shutdown_timeout(), &mut server).await {
        Ok(_) => info!("Server shutdown complete"),
        Err(_) => {
            warn!("Grace period elapsed, forcing shutdown");
            server.abort();
        }
    }

    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_v1 = Router::new()
        .route(
            "/knowledge-bases",
            get(handlers::knowledge_bases::list).post(handlers::knowledge_bases::create),
        )
        .route(
            "/knowledge-bases/:id",
            delete(handlers::knowledge_bases::remove),
        )
        .route(
            "/knowledge-bases/:id/summary",
            get(handlers::knowledge_bases::summary),
        )
        .route(
            "/knowledge-bases/:id/resources",
            get(handlers::kb_resources::list).post(handlers::kb_resources::upload),
        )
        .route(
            "/knowledge-bases/:id/resources/:resource_id",
            delete(handlers::kb_resources::remove),
        )
        .route("/knowledge-bases/:id/search", post(handlers::search::search))
        .route("/chat/completions", post(handlers::chat::completions))
        .route("/chat/history", get(handlers::chat::history))
        .route("/health", get(handlers::health::health));

    Router::new()
        .route(
            "/pdfs",
            post(handlers::resources::upload).get(handlers::resources::list),
        )
        .route("/conversion", post(handlers::conversion::convert))
        .route("/translation", post(handlers::translation::translate))
        .nest("/api/v1", api_v1)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
