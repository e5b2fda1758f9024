//! Core manager implementation split into focused submodules.
//!
//! The `DownloadManager` struct and its methods are organized by domain:
//! - [`submit`] - URL resolution, admission and deduplication
//! - [`runner`] - Fetch job execution and progress tracking
//! - [`webhooks`] - Completion webhook delivery
//! - [`lifecycle`] - Shutdown coordination

mod lifecycle;
mod runner;
mod submit;
mod webhooks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{MediaFetcher, UrlResolver};
use crate::registry::TaskRegistry;
use crate::types::Event;

pub(crate) use webhooks::WebhookDelivery;

/// Job admission and execution state
#[derive(Clone)]
pub(crate) struct JobState {
    /// Semaphore bounding concurrently running fetch jobs (respects max_concurrent config)
    pub(crate) job_limit: Arc<tokio::sync::Semaphore>,
    /// Flag to indicate whether new submissions are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Token cancelled once shutdown begins (observed by the embedded API server)
    pub(crate) shutdown_token: tokio_util::sync::CancellationToken,
}

/// Main manager instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct DownloadManager {
    /// Registry holding running and finished task records
    /// Public for integration tests to inspect task state
    pub registry: Arc<TaskRegistry>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Resolves submitted URLs to canonical task identifiers
    pub(crate) resolver: Arc<dyn UrlResolver>,
    /// Performs the actual content fetch for admitted tasks
    pub(crate) fetcher: Arc<dyn MediaFetcher>,
    /// Job admission and execution state
    pub(crate) jobs: JobState,
    /// Queue feeding the webhook notifier task
    pub(crate) webhook_tx: tokio::sync::mpsc::UnboundedSender<WebhookDelivery>,
}

impl DownloadManager {
    /// Create a new DownloadManager instance
    ///
    /// This initializes all core components:
    /// - Validates the configuration
    /// - Sets up the event broadcast channel
    /// - Creates the concurrency limiter sized by `jobs.max_concurrent`
    /// - Spawns the webhook notifier task
    ///
    /// The resolver and fetcher are the pluggable seams: the resolver maps a
    /// submitted URL to the identifier used for deduplication, and the
    /// fetcher performs the actual transfer once a job acquires a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub async fn new(
        config: Config,
        resolver: Arc<dyn UrlResolver>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Result<Self> {
        config.validate()?;

        // Create event broadcast channel (capacity 1000 events)
        let (event_tx, _) = tokio::sync::broadcast::channel(1000);

        // The notifier task drains this queue for the lifetime of the manager
        let (webhook_tx, webhook_rx) = tokio::sync::mpsc::unbounded_channel();
        webhooks::spawn_notifier(webhook_rx, config.webhook.timeout, event_tx.clone());

        let jobs = JobState {
            job_limit: Arc::new(tokio::sync::Semaphore::new(config.jobs.max_concurrent)),
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: tokio_util::sync::CancellationToken::new(),
        };

        Ok(Self {
            registry: Arc::new(TaskRegistry::new()),
            event_tx,
            config: Arc::new(config),
            resolver,
            fetcher,
            jobs,
            webhook_tx,
        })
    }

    /// Subscribe to task events
    ///
    /// Returns a receiver for the event broadcast channel. Multiple subscribers are supported;
    /// each receives all events emitted after the point of subscription.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use vod_dl::{DownloadManager, config::Config};
    /// # async fn example(resolver: Arc<dyn vod_dl::UrlResolver>, fetcher: Arc<dyn vod_dl::MediaFetcher>) -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = DownloadManager::new(Config::default(), resolver, fetcher).await?;
    ///
    /// let mut events = manager.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         tracing::info!(?event, "task event");
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    ///
    /// The configuration is wrapped in an Arc, so this is a cheap clone operation.
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped (ok() converts Err to None).
    /// This allows task processing to continue even if no one is listening to events.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with task processing and listens on the
    /// configured bind address (default: 127.0.0.1:58682). It stops when the
    /// manager's shutdown token is cancelled.
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let manager = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(manager, config).await })
    }
}
