//! Shutdown coordination.

use crate::types::Event;

use super::DownloadManager;

impl DownloadManager {
    /// Gracefully shut down the manager
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new submissions (further [`submit`] calls return
    ///    [`Error::ShuttingDown`])
    /// 2. Waits for running jobs to reach a terminal state, bounded by the
    ///    configured drain timeout
    /// 3. Cancels the shutdown token so the embedded API server stops
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Jobs still running when the drain timeout expires are left to finish
    /// in the background; their records stay in the running collection.
    ///
    /// [`submit`]: DownloadManager::submit
    /// [`Error::ShuttingDown`]: crate::error::Error::ShuttingDown
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new submissions
        self.jobs
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new submissions");

        // 2. Wait for running jobs to drain with timeout
        let drain_timeout = self.config.shutdown.drain_timeout;
        let wait_result = tokio::time::timeout(drain_timeout, self.wait_for_running_jobs()).await;

        match wait_result {
            Ok(()) => {
                tracing::info!("All running jobs reached a terminal state");
            }
            Err(_) => {
                tracing::warn!("Timeout waiting for running jobs, proceeding with shutdown");
            }
        }

        // 3. Stop the embedded API server
        self.jobs.shutdown_token.cancel();

        // 4. Emit shutdown event
        self.event_tx.send(Event::Shutdown).ok();

        tracing::info!("Graceful shutdown complete");
    }

    /// Wait until the registry holds no running records
    async fn wait_for_running_jobs(&self) {
        loop {
            if self.registry.running_count().await == 0 {
                return;
            }

            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }

    /// Token cancelled when shutdown stops the embedded API server
    ///
    /// The embedded API server drains its connections off this token;
    /// embedders can also observe it to tie their own background tasks to
    /// the manager's lifetime.
    pub fn shutdown_token(&self) -> tokio_util::sync::CancellationToken {
        self.jobs.shutdown_token.clone()
    }
}
