use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const QUEUE_KEY: &str = "resume_validation:jobs";
const PROCESSING_KEY: &str = "resume_validation:processing";

/// Job payload serialized into Redis.
///
/// Carries no derived state; reprocessing a job overwrites the candidate
/// record with a fresh verdict. `delivery_count` is the queue's own retry
/// bookkeeping and is not visible to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationJob {
    pub job_id: Uuid,
    pub candidate_id: String,
    pub resume_url: String,
    #[serde(default)]
    pub delivery_count: u32,
}

impl ValidationJob {
    pub fn new(candidate_id: String, resume_url: String) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            candidate_id,
            resume_url,
            delivery_count: 0,
        }
    }

    /// The payload re-enqueued after a failed delivery.
    fn next_delivery(&self) -> Self {
        Self {
            delivery_count: self.delivery_count + 1,
            ..self.clone()
        }
    }

    /// Whether another delivery would exceed the retry budget.
    fn retries_exhausted(&self, max_deliveries: u32) -> bool {
        self.delivery_count + 1 >= max_deliveries
    }
}

/// Redis-backed async job queue with bounded redelivery.
///
/// LPUSH to enqueue, RPOPLPUSH into a processing list to dequeue, so each job
/// has at most one active delivery even with several workers polling.
pub struct JobQueue {
    client: redis::Client,
    max_deliveries: u32,
}

impl JobQueue {
    pub fn new(redis_url: &str, max_deliveries: u32) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(QueueError::Redis)?;
        Ok(Self {
            client,
            max_deliveries,
        })
    }

    /// Enqueue a validation job.
    pub async fn enqueue(&self, job: &ValidationJob) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let payload = serde_json::to_string(job).map_err(QueueError::Serialize)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, &payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Dequeue a job for processing (pop with move to the processing list).
    pub async fn dequeue(&self) -> Result<Option<ValidationJob>, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let result: Option<String> = conn
            .rpoplpush(QUEUE_KEY, PROCESSING_KEY)
            .await
            .map_err(QueueError::Redis)?;

        match result {
            Some(payload) => {
                let job: ValidationJob =
                    serde_json::from_str(&payload).map_err(QueueError::Serialize)?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    /// Mark a delivery as done (remove from the processing list).
    pub async fn complete(&self, job: &ValidationJob) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let payload = serde_json::to_string(job).map_err(QueueError::Serialize)?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, &payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Re-enqueue a failed delivery with its counter bumped.
    ///
    /// Returns `false` without re-enqueueing once the retry budget is spent;
    /// the stuck record is then left to the reconciliation sweep.
    pub async fn retry(&self, job: &ValidationJob) -> Result<bool, QueueError> {
        self.complete(job).await?;
        if job.retries_exhausted(self.max_deliveries) {
            return Ok(false);
        }
        self.enqueue(&job.next_delivery()).await?;
        Ok(true)
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Current number of pending (not yet delivered) jobs.
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let depth: u64 = conn.llen(QUEUE_KEY).await.map_err(QueueError::Redis)?;
        Ok(depth)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delivery_bumps_counter_and_keeps_identity() {
        let job = ValidationJob::new("u1".to_string(), "https://files/cv.pdf".to_string());
        let retried = job.next_delivery();
        assert_eq!(retried.job_id, job.job_id);
        assert_eq!(retried.candidate_id, "u1");
        assert_eq!(retried.delivery_count, 1);
    }

    #[test]
    fn retry_budget_counts_the_initial_delivery() {
        let mut job = ValidationJob::new("u1".to_string(), "https://files/cv.pdf".to_string());
        // max_deliveries = 3: deliveries 0 and 1 may retry, delivery 2 may not.
        assert!(!job.retries_exhausted(3));
        job.delivery_count = 1;
        assert!(!job.retries_exhausted(3));
        job.delivery_count = 2;
        assert!(job.retries_exhausted(3));
    }

    #[test]
    fn payload_without_delivery_count_defaults_to_zero() {
        let job: ValidationJob = serde_json::from_str(
            r#"{"job_id":"6f4a9c6e-8d21-4a4b-9d7a-0b6a8c1a2b3c","candidate_id":"u1","resume_url":"https://files/cv.pdf"}"#,
        )
        .unwrap();
        assert_eq!(job.delivery_count, 0);
    }
}
