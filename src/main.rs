mod app_state;
mod config;
mod db;
mod models;
mod routes;
mod services;

use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{
    classifier::ClassifierClient, mailer::Mailer, queue::JobQueue, storage::ObjectStore,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing resume-verify API server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "validation_jobs_total",
        "Total validation jobs submitted via the intake endpoint"
    );
    metrics::describe_gauge!(
        "validation_queue_depth",
        "Current number of pending jobs in the queue"
    );

    // Initialize record store
    tracing::info!("Connecting to PostgreSQL record store");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize Redis job queue
    tracing::info!("Connecting to Redis job queue");
    let queue = JobQueue::new(&config.redis_url, config.queue_max_deliveries)
        .expect("Failed to initialize job queue");

    // Initialize object storage for uploaded resumes
    tracing::info!("Initializing resume object store");
    let storage = ObjectStore::new(
        &config.storage_bucket,
        &config.storage_endpoint,
        &config.storage_access_key,
        &config.storage_secret_key,
    )
    .expect("Failed to initialize object store");

    // Initialize classifier client (used by the synchronous screening route)
    let classifier = ClassifierClient::new(
        &config.inference_url,
        &config.screening_model,
        &config.scoring_model,
    )
    .expect("Failed to initialize classifier client");

    // Initialize approval-notice mailer
    let mailer = Mailer::new(
        &config.smtp_host,
        config.smtp_port,
        &config.smtp_user,
        &config.smtp_pass,
        &config.sender_mailbox(),
    )
    .expect("Failed to initialize mailer");

    // Create shared application state
    let state = AppState::new(db_pool, queue, storage, classifier, mailer);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/api/queue-validation",
            post(routes::validate::queue_validation),
        )
        .route("/api/screen-resume", post(routes::validate::screen_resume))
        .route("/api/upload-resume", post(routes::upload::upload_resume))
        .route(
            "/api/candidates/{candidate_id}/status",
            get(routes::validate::candidate_status),
        )
        .route(
            "/api/send-approval-email",
            post(routes::notify::send_approval_email),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::render_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting resume-verify on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
