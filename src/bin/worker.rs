use chrono::Utc;
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use resume_verify::{
    config::AppConfig,
    db::{self, queries},
    services::{
        classifier::ClassifierClient,
        pipeline::{self, JobOutcome},
        queue::JobQueue,
    },
};

const POLL_INTERVAL_MS: u64 = 1000; // 1 second

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting resume validation worker");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Expose worker metrics for scraping
    let metrics_addr: SocketAddr = config
        .worker_metrics_addr
        .parse()
        .expect("Invalid worker metrics address");
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .expect("Failed to install Prometheus metrics exporter");

    metrics::describe_histogram!(
        "validation_processing_seconds",
        "Time to run one validation job to a terminal record write"
    );
    metrics::describe_counter!("validation_jobs_accepted", "Jobs ending in an accepted record");
    metrics::describe_counter!("validation_jobs_rejected", "Jobs ending in a rejected record");
    metrics::describe_counter!(
        "validation_jobs_failed",
        "Job deliveries that errored and were handed to the retry policy"
    );

    // Initialize record store
    tracing::info!("Connecting to PostgreSQL record store");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Initialize services
    tracing::info!("Initializing services");
    let queue = JobQueue::new(&config.redis_url, config.queue_max_deliveries)
        .expect("Failed to initialize job queue");

    let classifier = ClassifierClient::new(
        &config.inference_url,
        &config.screening_model,
        &config.scoring_model,
    )
    .expect("Failed to initialize classifier client");

    // Reconciliation sweep: force-reject records stuck in `processing` past
    // the deadline, outside the per-job hot path.
    tokio::spawn(reconciliation_loop(
        db_pool.clone(),
        Duration::from_secs(config.processing_deadline_secs),
        Duration::from_secs(config.reconcile_interval_secs),
    ));

    tracing::info!("Worker ready, starting job processing loop");

    // Main processing loop
    loop {
        match process_next_job(&db_pool, &queue, &classifier).await {
            Ok(true) => {
                tracing::debug!("Job processed, checking for next job");
            }
            Ok(false) => {
                tracing::trace!("No jobs available, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error processing job, will retry");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Process the next job from the queue.
/// Returns Ok(true) if a job was processed, Ok(false) if no job available.
async fn process_next_job(
    db: &PgPool,
    queue: &JobQueue,
    classifier: &ClassifierClient,
) -> Result<bool, Box<dyn std::error::Error>> {
    let job = match queue.dequeue().await? {
        Some(j) => j,
        None => return Ok(false), // No job available
    };

    tracing::info!(
        job_id = %job.job_id,
        candidate_id = %job.candidate_id,
        delivery = job.delivery_count,
        "Processing validation job"
    );

    let start = Instant::now();
    match pipeline::run_validation(db, classifier, &job).await {
        Ok(outcome) => {
            queue.complete(&job).await?;

            metrics::histogram!("validation_processing_seconds")
                .record(start.elapsed().as_secs_f64());
            match outcome {
                JobOutcome::Accepted => {
                    metrics::counter!("validation_jobs_accepted").increment(1)
                }
                _ => metrics::counter!("validation_jobs_rejected").increment(1),
            }

            tracing::info!(
                job_id = %job.job_id,
                candidate_id = %job.candidate_id,
                outcome = ?outcome,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Validation job completed"
            );

            Ok(true)
        }
        Err(e) => {
            tracing::error!(job_id = %job.job_id, error = %e, "Validation job failed");
            metrics::counter!("validation_jobs_failed").increment(1);

            // Hand the delivery to the retry policy; the record stays in
            // `processing` until a later delivery or the sweep resolves it.
            if queue.retry(&job).await? {
                tracing::info!(
                    job_id = %job.job_id,
                    delivery = job.delivery_count + 1,
                    "Job re-queued for retry"
                );
            } else {
                tracing::warn!(
                    job_id = %job.job_id,
                    candidate_id = %job.candidate_id,
                    "Retry budget exhausted; record left to the reconciliation sweep"
                );
            }

            Ok(true)
        }
    }
}

async fn reconciliation_loop(db: PgPool, deadline: Duration, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let cutoff = Utc::now() - chrono::Duration::seconds(deadline.as_secs() as i64);
        match queries::reconcile_stuck_processing(&db, cutoff, pipeline::TIMEOUT_REJECTION).await {
            Ok(candidates) if !candidates.is_empty() => {
                tracing::warn!(
                    count = candidates.len(),
                    candidates = ?candidates,
                    "Force-rejected records stuck in processing"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Reconciliation sweep failed");
            }
        }
    }
}
