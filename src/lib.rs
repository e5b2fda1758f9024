//! # vod-dl
//!
//! Embeddable download-task registry with a REST API for asynchronous media
//! fetch jobs.
//!
//! ## Design Philosophy
//!
//! vod-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Pluggable** - Bring your own URL resolver and fetcher implementations
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Self-serving** - The REST API server is embedded, one call to spawn
//!
//! Submitted URLs are resolved to canonical identifiers, deduplicated
//! against in-flight work, fetched by a bounded pool of detached jobs, and
//! kept queryable as running/finished records until explicitly purged.
//! A finished task can optionally notify a caller-supplied webhook once,
//! best-effort.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vod_dl::{Config, DownloadManager, MediaFetcher, UrlResolver};
//!
//! # async fn example(resolver: Arc<dyn UrlResolver>, fetcher: Arc<dyn MediaFetcher>) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(
//!     DownloadManager::new(Config::default(), resolver, fetcher).await?,
//! );
//!
//! // Subscribe to events
//! let mut events = manager.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//! });
//!
//! // Serve the REST API until shutdown
//! manager.spawn_api_server();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Pluggable resolution and fetch seams
pub mod fetch;
/// Core manager implementation (decomposed into focused submodules)
pub mod manager;
/// Running/finished task registry
pub mod registry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{FetchProgress, FetchedMedia, MediaFetcher, ProgressSink, UrlResolver};
pub use manager::DownloadManager;
pub use registry::TaskRegistry;
pub use types::{
    Event, SubmitRequest, TaskCollection, TaskId, TaskOptions, TaskSnapshot,
};

/// Run the manager until a termination signal arrives, then shut it down.
///
/// On Unix this waits for SIGTERM or SIGINT; elsewhere it waits for Ctrl+C
/// via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vod_dl::{Config, DownloadManager, run_with_shutdown};
///
/// # async fn example(resolver: Arc<dyn vod_dl::UrlResolver>, fetcher: Arc<dyn vod_dl::MediaFetcher>) -> Result<(), Box<dyn std::error::Error>> {
/// let manager = Arc::new(
///     DownloadManager::new(Config::default(), resolver, fetcher).await?,
/// );
/// manager.spawn_api_server();
///
/// // Run with automatic signal handling
/// run_with_shutdown(&manager).await;
/// # Ok(())
/// # }
/// ```
pub async fn run_with_shutdown(manager: &DownloadManager) {
    wait_for_signal().await;
    manager.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments; ctrl_c still works
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
            tokio::signal::ctrl_c().await.ok();
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT (Ctrl+C)"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}
