use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{
    classifier::ClassifierClient, mailer::Mailer, queue::JobQueue, storage::ObjectStore,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: Arc<JobQueue>,
    pub storage: Arc<ObjectStore>,
    pub classifier: Arc<ClassifierClient>,
    pub mailer: Arc<Mailer>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        queue: JobQueue,
        storage: ObjectStore,
        classifier: ClassifierClient,
        mailer: Mailer,
    ) -> Self {
        Self {
            db,
            queue: Arc::new(queue),
            storage: Arc::new(storage),
            classifier: Arc::new(classifier),
            mailer: Arc::new(mailer),
        }
    }
}
