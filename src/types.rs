//! Core types for vod-dl

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::fetch::{FetchProgress, FetchedMedia};

/// Canonical content identifier a task is keyed on
///
/// Produced by the [`UrlResolver`](crate::fetch::UrlResolver) from the raw
/// submitted URL. Distinct inputs may resolve to the same identifier; the
/// registry deduplicates on this value, never on the raw URL.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One download task owned by the registry
///
/// Mutable state lives behind the registry lock; everything readers see is a
/// [`TaskSnapshot`] copied out of this under that lock. After admission only
/// the owning job mutates a record, and only through the registry.
#[derive(Clone, Debug)]
pub struct TaskRecord {
    /// Canonical content identifier
    pub id: TaskId,

    /// Original submitted URL
    pub source_url: String,

    /// Admission time, seconds since epoch
    pub created_at: i64,

    /// Completion time, seconds since epoch; None while running
    pub finished_at: Option<i64>,

    /// Content title, known after a successful fetch
    pub title: Option<String>,

    /// Thumbnail URL, known after a successful fetch
    pub thumbnail: Option<String>,

    /// Content publication time, seconds since epoch
    pub published_at: Option<i64>,

    /// Completed fraction in [0, 1]; exactly 1 only on success
    pub progress: f64,

    /// Average transfer rate in bytes per second, computed on success
    pub download_speed: f64,

    /// Cumulative bytes transferred, non-decreasing while running
    pub total_bytes: u64,

    /// Whether the fetch completed successfully
    pub successful: bool,

    /// Output files produced by the fetch, in production order
    pub save_paths: Vec<PathBuf>,
}

impl TaskRecord {
    /// Create a fresh record at admission time
    pub fn new(id: TaskId, source_url: impl Into<String>) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            created_at: Utc::now().timestamp(),
            finished_at: None,
            title: None,
            thumbnail: None,
            published_at: None,
            progress: 0.0,
            download_speed: 0.0,
            total_bytes: 0,
            successful: false,
            save_paths: Vec::new(),
        }
    }

    /// Apply an in-flight progress report
    ///
    /// `progress` and `total_bytes` never decrease; `progress` is clamped to
    /// [0, 1]. A report carrying paths replaces the recorded set, a report
    /// without paths leaves it unchanged.
    pub fn apply_progress(&mut self, update: &FetchProgress) {
        let fraction = update.fraction.clamp(0.0, 1.0);
        if fraction > self.progress {
            self.progress = fraction;
        }
        if update.bytes > self.total_bytes {
            self.total_bytes = update.bytes;
        }
        if let Some(paths) = &update.paths {
            self.save_paths = paths.clone();
        }
    }

    /// Apply the terminal mutation
    ///
    /// Sets `finished_at` and, on success, the returned metadata, `progress=1`
    /// and the average speed over the task's wall-clock lifetime (duration
    /// floored at one second). A failed completion leaves the partial fields
    /// as the last progress report left them.
    pub fn complete(&mut self, completion: TaskCompletion) {
        let now = Utc::now().timestamp();
        self.finished_at = Some(now);

        if let TaskCompletion::Success(media) = completion {
            self.title = media.title;
            self.thumbnail = media.thumbnail;
            self.published_at = media.published_at;
            self.save_paths = media.save_paths;
            if media.total_bytes > self.total_bytes {
                self.total_bytes = media.total_bytes;
            }
            self.successful = true;
            self.progress = 1.0;

            let elapsed = (now - self.created_at).max(1);
            self.download_speed = self.total_bytes as f64 / elapsed as f64;
        }
    }

    /// Copy the current state into the wire form
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            url: self.source_url.clone(),
            created_at: self.created_at,
            title: self.title.clone(),
            thumbnail: self.thumbnail.clone(),
            published_at: self.published_at,
            finished_at: self.finished_at,
            progress: self.progress,
            download_speed: self.download_speed,
            total_bytes: self.total_bytes,
            successful: self.successful,
            save_paths: self.save_paths.clone(),
        }
    }
}

/// Terminal outcome of one job, applied exactly once per record
#[derive(Clone, Debug)]
pub enum TaskCompletion {
    /// Fetch finished and produced output
    Success(FetchedMedia),
    /// Resolution or fetch failed; the reason goes to logs and events
    Failed,
}

/// Point-in-time copy of a task in the wire format
///
/// This is what every read endpoint returns and what the webhook body
/// carries. Optional fields are omitted from JSON until set.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskSnapshot {
    /// Canonical content identifier
    pub id: TaskId,

    /// Original submitted URL
    pub url: String,

    /// Admission time, seconds since epoch
    #[serde(rename = "taskCreateTime")]
    pub created_at: i64,

    /// Content title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Thumbnail URL
    #[serde(default, rename = "pic", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Content publication time, seconds since epoch
    #[serde(default, rename = "videoPubTime", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<i64>,

    /// Completion time, seconds since epoch; absent while running
    #[serde(default, rename = "taskFinishTime", skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,

    /// Completed fraction in [0, 1]
    pub progress: f64,

    /// Average transfer rate in bytes per second
    #[serde(rename = "downloadSpeed")]
    pub download_speed: f64,

    /// Cumulative bytes transferred
    #[serde(rename = "totalDownloadedBytes")]
    pub total_bytes: u64,

    /// Whether the fetch completed successfully
    #[serde(rename = "isSuccessful")]
    pub successful: bool,

    /// Output files produced by the fetch
    #[serde(rename = "savePaths")]
    pub save_paths: Vec<PathBuf>,
}

/// Both registry partitions in one response body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskCollection {
    /// Tasks admitted but not yet terminal
    pub running: Vec<TaskSnapshot>,

    /// Terminal tasks, successful or not
    pub finished: Vec<TaskSnapshot>,
}

/// Fetch options forwarded opaquely to the [`MediaFetcher`](crate::fetch::MediaFetcher)
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskOptions {
    /// Preferred quality/encoding label (None = fetcher default)
    #[serde(default)]
    pub quality: Option<String>,

    /// Output naming pattern (None = fetcher default)
    #[serde(default)]
    pub file_pattern: Option<String>,

    /// Fetch the audio stream only
    #[serde(default)]
    pub audio_only: bool,

    /// Also fetch subtitle tracks
    #[serde(default)]
    pub subtitles: bool,
}

/// Body of `POST /add-task`
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Source URL to resolve and fetch
    pub url: String,

    /// Fetch options, flattened into the same JSON object
    #[serde(flatten)]
    pub options: TaskOptions,

    /// Callback URL to POST the finished record to (http/https)
    #[serde(default)]
    pub callback_webhook: Option<String>,
}

/// Event emitted during task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// New task admitted into the running collection
    TaskAdmitted {
        /// Task ID
        id: TaskId,
        /// Submitted URL
        url: String,
    },

    /// Submission matched an already-running task
    TaskDeduplicated {
        /// Existing task ID
        id: TaskId,
    },

    /// Worker permit acquired, fetch starting
    TaskStarted {
        /// Task ID
        id: TaskId,
    },

    /// In-flight progress report
    TaskProgress {
        /// Task ID
        id: TaskId,
        /// Completed fraction (0.0 to 1.0)
        progress: f64,
        /// Cumulative bytes transferred
        total_bytes: u64,
    },

    /// Resolution or fetch failed
    TaskFailed {
        /// Task ID
        id: TaskId,
        /// Error message
        error: String,
    },

    /// Task moved to the finished collection
    TaskFinished {
        /// Task ID
        id: TaskId,
        /// Terminal outcome
        successful: bool,
    },

    /// Webhook delivery failed
    WebhookFailed {
        /// Webhook URL
        url: String,
        /// Error message
        error: String,
    },

    /// Graceful shutdown initiated
    Shutdown,
}
