//! REST API server example
//!
//! This example runs vod-dl with stub resolver/fetcher implementations,
//! allowing the HTTP surface to be exercised without real media sources.
//!
//! After starting, you can:
//! - Submit tasks via POST http://localhost:58682/add-task
//! - Monitor progress via GET http://localhost:58682/get-tasks
//! - Stream events via GET http://localhost:58682/events

use std::path::PathBuf;
use std::sync::Arc;

use vod_dl::{
    Config, DownloadManager, FetchProgress, FetchedMedia, MediaFetcher, ProgressSink, TaskId,
    TaskOptions, UrlResolver,
};

/// Resolver deriving the identifier from the URL's last path segment
struct DemoResolver;

#[async_trait::async_trait]
impl UrlResolver for DemoResolver {
    async fn resolve(&self, url: &str) -> vod_dl::Result<TaskId> {
        let parsed = url::Url::parse(url)
            .map_err(|e| vod_dl::Error::Resolve(format!("unparseable URL {url}: {e}")))?;

        let segment = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| vod_dl::Error::Resolve(format!("no content id in {url}")))?;

        Ok(TaskId::new(format!("demo-{segment}")))
    }
}

/// Fetcher that simulates a ten-step transfer instead of hitting the network
struct DemoFetcher;

#[async_trait::async_trait]
impl MediaFetcher for DemoFetcher {
    async fn fetch(
        &self,
        id: &TaskId,
        _options: &TaskOptions,
        progress: &dyn ProgressSink,
    ) -> vod_dl::Result<FetchedMedia> {
        const TOTAL_BYTES: u64 = 10_000_000;
        const STEPS: u64 = 10;

        let path = PathBuf::from(format!("downloads/{id}.mp4"));
        for step in 1..=STEPS {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            progress
                .update(FetchProgress {
                    fraction: step as f64 / STEPS as f64,
                    bytes: TOTAL_BYTES * step / STEPS,
                    paths: Some(vec![path.clone()]),
                })
                .await;
        }

        Ok(FetchedMedia {
            title: Some(format!("Demo video {id}")),
            thumbnail: None,
            published_at: Some(chrono::Utc::now().timestamp()),
            save_paths: vec![path],
            total_bytes: TOTAL_BYTES,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = Config::default();
    let bind_address = config.api.bind_address;

    let manager = Arc::new(
        DownloadManager::new(config, Arc::new(DemoResolver), Arc::new(DemoFetcher)).await?,
    );

    // Log every event to stdout
    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("event: {event:?}");
        }
    });

    let api_handle = manager.spawn_api_server();

    println!("🚀 Starting vod-dl REST API server");
    println!("📡 API Base: http://{bind_address}");
    println!("🔄 Events stream: http://{bind_address}/events");
    println!();
    println!("Example commands:");
    println!("  # Submit a download task");
    println!("  curl -X POST http://{bind_address}/add-task \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"url\": \"https://example.com/v/12345\"}}'");
    println!();
    println!("  # Poll task state");
    println!("  curl http://{bind_address}/get-tasks");
    println!();
    println!("  # Stream events (Server-Sent Events)");
    println!("  curl -N http://{bind_address}/events");
    println!();
    println!("Press Ctrl+C to shut down gracefully");

    // Wait for Ctrl+C, then drain running jobs and stop the server
    vod_dl::run_with_shutdown(&manager).await;
    api_handle.await??;

    Ok(())
}
