//! Fetch job execution and progress tracking.

use std::sync::Arc;

use crate::fetch::{FetchProgress, ProgressSink};
use crate::registry::TaskRegistry;
use crate::types::{Event, TaskCompletion, TaskId, TaskOptions};

use super::DownloadManager;

/// Progress sink writing fetcher reports through the registry and mirroring
/// them onto the event channel.
struct RegistryProgress {
    registry: Arc<TaskRegistry>,
    event_tx: tokio::sync::broadcast::Sender<Event>,
    id: TaskId,
}

#[async_trait::async_trait]
impl ProgressSink for RegistryProgress {
    async fn update(&self, update: FetchProgress) {
        self.registry.record_progress(&self.id, &update).await;
        self.event_tx
            .send(Event::TaskProgress {
                id: self.id.clone(),
                progress: update.fraction,
                total_bytes: update.bytes,
            })
            .ok();
    }
}

impl DownloadManager {
    /// Spawn a detached fetch job for a newly admitted task
    ///
    /// The job outlives the submitting request. Jobs beyond the configured
    /// concurrency limit park in the semaphore's FIFO wait queue, so
    /// admission order is preserved when slots free up.
    pub(crate) fn spawn_job(
        &self,
        id: TaskId,
        options: TaskOptions,
        callback_webhook: Option<String>,
    ) {
        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_job(id, options, callback_webhook).await;
        });
    }

    /// Drive a single task from admitted to its terminal state
    async fn run_job(&self, id: TaskId, options: TaskOptions, callback_webhook: Option<String>) {
        // Acquire a concurrency slot (blocks while max_concurrent jobs are running)
        let permit = self.jobs.job_limit.clone().acquire_owned().await;
        let _permit = match permit {
            Ok(p) => p,
            Err(_) => {
                // Semaphore closed — record the task as failed rather than
                // leaving it parked in running forever
                tracing::warn!(task_id = %id, "job slot unavailable, failing task");
                self.finish_job(id, TaskCompletion::Failed, callback_webhook)
                    .await;
                return;
            }
        };

        self.emit_event(Event::TaskStarted { id: id.clone() });
        tracing::info!(task_id = %id, "starting fetch job");

        let sink = RegistryProgress {
            registry: Arc::clone(&self.registry),
            event_tx: self.event_tx.clone(),
            id: id.clone(),
        };

        let completion = match self.fetcher.fetch(&id, &options, &sink).await {
            Ok(media) => TaskCompletion::Success(media),
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "fetch job failed");
                self.emit_event(Event::TaskFailed {
                    id: id.clone(),
                    error: e.to_string(),
                });
                TaskCompletion::Failed
            }
        };

        self.finish_job(id, completion, callback_webhook).await;
    }

    /// Move a task to finished, emit the terminal event and queue its webhook
    async fn finish_job(
        &self,
        id: TaskId,
        completion: TaskCompletion,
        callback_webhook: Option<String>,
    ) {
        let Some(snapshot) = self.registry.finish(&id, completion).await else {
            // Registry had no running record for the id, nothing to report
            tracing::error!(task_id = %id, "finished job had no running record");
            return;
        };

        tracing::info!(
            task_id = %id,
            successful = snapshot.successful,
            "task reached terminal state"
        );
        self.emit_event(Event::TaskFinished {
            id,
            successful: snapshot.successful,
        });

        if let Some(url) = callback_webhook {
            self.queue_webhook(url, snapshot);
        }
    }
}
