use serde::Deserialize;

/// Process-wide configuration, loaded once at startup from the environment
/// and passed explicitly into each component constructor.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Unused by the worker.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string (candidate record store)
    pub database_url: String,

    /// Redis connection string for the job queue
    pub redis_url: String,

    /// Base URL of the local inference endpoint
    #[serde(default = "default_inference_url")]
    pub inference_url: String,

    /// Model used for lightweight binary screening
    #[serde(default = "default_screening_model")]
    pub screening_model: String,

    /// Model used for full scored evaluation
    #[serde(default = "default_scoring_model")]
    pub scoring_model: String,

    /// Total deliveries (first + retries) a job gets before it is dropped
    #[serde(default = "default_queue_max_deliveries")]
    pub queue_max_deliveries: u32,

    /// How long a record may sit in `processing` before the sweep rejects it
    #[serde(default = "default_processing_deadline_secs")]
    pub processing_deadline_secs: u64,

    /// How often the worker runs the reconciliation sweep
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,

    /// Prometheus exporter address for the worker process
    #[serde(default = "default_worker_metrics_addr")]
    pub worker_metrics_addr: String,

    /// S3-compatible bucket holding uploaded resumes
    pub storage_bucket: String,
    pub storage_endpoint: String,
    pub storage_access_key: String,
    pub storage_secret_key: String,

    /// SMTP relay for approval notices
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    /// Sender mailbox; defaults to the event identity over the SMTP account.
    #[serde(default)]
    pub smtp_from: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_inference_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_screening_model() -> String {
    "llama3:8b".to_string()
}

fn default_scoring_model() -> String {
    "qwen2:7b".to_string()
}

fn default_queue_max_deliveries() -> u32 {
    3
}

fn default_processing_deadline_secs() -> u64 {
    600
}

fn default_reconcile_interval_secs() -> u64 {
    60
}

fn default_worker_metrics_addr() -> String {
    "0.0.0.0:9464".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn sender_mailbox(&self) -> String {
        self.smtp_from
            .clone()
            .unwrap_or_else(|| format!("Code & Quest Feria <{}>", self.smtp_user))
    }
}
