//! Collaborator seams — URL resolution and media fetching.
//!
//! The registry never talks to a content platform itself. Hosts supply an
//! implementation of [`UrlResolver`] (raw URL → canonical id) and
//! [`MediaFetcher`] (id → files on disk); the crate drives them and owns all
//! task state. Fetchers report liveness through the [`ProgressSink`] handed
//! to them, which writes straight through to the owning task record.

use crate::error::Result;
use crate::types::{TaskId, TaskOptions};
use std::path::PathBuf;

/// Resolves a submitted URL (or id-like string) to the canonical content id.
///
/// Resolution runs before admission, and the returned id is the key every
/// dedup and lookup operation uses. Implementations must be idempotent:
/// resolving the same input twice yields the same id.
#[async_trait::async_trait]
pub trait UrlResolver: Send + Sync {
    /// Resolve `url` to its canonical id
    async fn resolve(&self, url: &str) -> Result<TaskId>;
}

/// Performs the actual content fetch for one resolved id.
///
/// Called at most once per admitted task, under the worker-pool permit.
/// Implementations should call [`ProgressSink::update`] as transfer
/// progresses; reports become visible to HTTP readers immediately.
#[async_trait::async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the content for `id`, writing output files and reporting
    /// progress through `progress`
    async fn fetch(
        &self,
        id: &TaskId,
        options: &TaskOptions,
        progress: &dyn ProgressSink,
    ) -> Result<FetchedMedia>;
}

/// Receiver for in-flight progress reports, implemented by the job runner
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    /// Record one progress report against the owning task
    async fn update(&self, update: FetchProgress);
}

/// One in-flight progress report from a fetcher
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchProgress {
    /// Completed fraction in [0, 1]; out-of-range values are clamped
    pub fraction: f64,

    /// Cumulative bytes transferred so far
    pub bytes: u64,

    /// Output files produced so far; None leaves the recorded set unchanged
    pub paths: Option<Vec<PathBuf>>,
}

/// Final result of a successful fetch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedMedia {
    /// Content title
    pub title: Option<String>,

    /// Thumbnail URL
    pub thumbnail: Option<String>,

    /// Content publication time, seconds since epoch
    pub published_at: Option<i64>,

    /// Output files, in production order
    pub save_paths: Vec<PathBuf>,

    /// Total bytes transferred
    pub total_bytes: u64,
}
