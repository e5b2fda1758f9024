//! Shared test helpers for creating DownloadManager instances in tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::{FetchProgress, FetchedMedia, MediaFetcher, ProgressSink, UrlResolver};
use crate::manager::DownloadManager;
use crate::types::{Event, SubmitRequest, TaskId, TaskOptions};

/// Resolver that derives identifiers from URLs without network access.
///
/// URLs containing "unresolvable" fail resolution; everything else maps to
/// `id-<last path segment>`, so distinct URLs sharing a tail resolve to the
/// same identifier.
pub(crate) struct StubResolver;

#[async_trait::async_trait]
impl UrlResolver for StubResolver {
    async fn resolve(&self, url: &str) -> Result<TaskId> {
        if url.contains("unresolvable") {
            return Err(Error::Resolve(format!("no media found at {url}")));
        }

        let tail = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
        Ok(TaskId::new(format!("id-{tail}")))
    }
}

/// What a [`ScriptedFetcher`] does when a job reaches it
pub(crate) enum FetchScript {
    /// Report progress twice, then succeed with the given media
    Succeed(FetchedMedia),
    /// Report partial progress, then fail with the given message
    Fail(String),
    /// Block until [`ScriptedFetcher::release`] is called, then succeed
    BlockUntilReleased,
}

/// Fetcher following a fixed script, shared by every job of a test manager
pub(crate) struct ScriptedFetcher {
    script: FetchScript,
    calls: AtomicUsize,
    gate: Notify,
}

impl ScriptedFetcher {
    pub(crate) fn new(script: FetchScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        })
    }

    /// Unblock one job waiting inside a `BlockUntilReleased` script
    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }

    /// Number of times `fetch` was entered
    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        id: &TaskId,
        _options: &TaskOptions,
        progress: &dyn ProgressSink,
    ) -> Result<FetchedMedia> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            FetchScript::Succeed(media) => {
                progress
                    .update(FetchProgress {
                        fraction: 0.25,
                        bytes: media.total_bytes / 4,
                        paths: None,
                    })
                    .await;
                progress
                    .update(FetchProgress {
                        fraction: 0.75,
                        bytes: media.total_bytes * 3 / 4,
                        paths: Some(media.save_paths.clone()),
                    })
                    .await;
                Ok(media.clone())
            }
            FetchScript::Fail(reason) => {
                progress
                    .update(FetchProgress {
                        fraction: 0.1,
                        bytes: 512,
                        paths: None,
                    })
                    .await;
                Err(Error::Download(reason.clone()))
            }
            FetchScript::BlockUntilReleased => {
                self.gate.notified().await;
                Ok(FetchedMedia {
                    title: Some(format!("released {id}")),
                    total_bytes: 1024,
                    ..Default::default()
                })
            }
        }
    }
}

/// Helper to create a test DownloadManager with stub collaborators.
pub(crate) async fn create_test_manager(fetcher: Arc<ScriptedFetcher>) -> DownloadManager {
    create_test_manager_with_config(Config::default(), fetcher).await
}

/// Same as [`create_test_manager`] but with a caller-supplied configuration.
pub(crate) async fn create_test_manager_with_config(
    config: Config,
    fetcher: Arc<ScriptedFetcher>,
) -> DownloadManager {
    DownloadManager::new(config, Arc::new(StubResolver), fetcher)
        .await
        .unwrap()
}

/// Build a submission for `url` with default options and no webhook
pub(crate) fn submit_request(url: &str) -> SubmitRequest {
    SubmitRequest {
        url: url.to_string(),
        options: TaskOptions::default(),
        callback_webhook: None,
    }
}

/// Media payload used by success-path tests
pub(crate) fn sample_media() -> FetchedMedia {
    FetchedMedia {
        title: Some("Conference Keynote 2024".to_string()),
        thumbnail: Some("https://cdn.example.com/thumbs/keynote.jpg".to_string()),
        published_at: Some(1_700_000_000),
        save_paths: vec![
            PathBuf::from("/media/keynote.mp4"),
            PathBuf::from("/media/keynote.srt"),
        ],
        total_bytes: 4_096_000,
    }
}

/// Wait for the TaskFinished event for `id`, returning its outcome.
///
/// Subscribe before submitting so the event cannot be missed. Panics after
/// five seconds to keep a hung job from stalling the suite.
pub(crate) async fn wait_for_finished(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    id: &TaskId,
) -> bool {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(Event::TaskFinished {
                    id: finished,
                    successful,
                }) if finished == *id => return successful,
                Ok(_) => {}
                Err(e) => panic!("event channel closed while waiting for {id}: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for task to finish")
}
