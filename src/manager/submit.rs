//! URL resolution, admission and deduplication.

use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::types::{Event, SubmitRequest, TaskCompletion, TaskId, TaskSnapshot};

use super::DownloadManager;

impl DownloadManager {
    /// Submit a URL for download
    ///
    /// Resolves the URL to its canonical task identifier, admits a record
    /// into the registry, and spawns a detached fetch job when the
    /// identifier was not already known. The returned snapshot reflects the
    /// record at admission time; resubmissions of a known identifier return
    /// the existing record without starting a second job.
    ///
    /// A URL that fails resolution still produces a record: it is admitted
    /// under the raw URL and immediately moved to finished as unsuccessful,
    /// so callers can observe the failure through the normal listing
    /// endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once shutdown has begun, or
    /// [`Error::InvalidRequest`] when the URL is empty or the callback
    /// webhook is not a valid http(s) URL.
    pub async fn submit(&self, request: SubmitRequest) -> Result<TaskSnapshot> {
        if !self.jobs.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        validate_request(&request)?;

        let SubmitRequest {
            url,
            options,
            callback_webhook,
        } = request;

        let id = match self.resolver.resolve(&url).await {
            Ok(id) => id,
            Err(e) => return self.admit_unresolvable(url, callback_webhook, &e).await,
        };

        let (snapshot, is_new) = self.registry.admit_or_get(id.clone(), &url).await;
        if !is_new {
            if callback_webhook.is_some() {
                tracing::debug!(
                    task_id = %id,
                    "duplicate submission, ignoring callback webhook from this request"
                );
            }
            self.emit_event(Event::TaskDeduplicated { id });
            return Ok(snapshot);
        }

        tracing::info!(task_id = %id, url = %url, "admitted new task");
        self.emit_event(Event::TaskAdmitted {
            id: id.clone(),
            url,
        });
        self.spawn_job(id, options, callback_webhook);

        Ok(snapshot)
    }

    /// Record a URL that failed resolution as a finished, unsuccessful task
    ///
    /// The raw URL doubles as the identifier, so repeated submissions of the
    /// same broken URL deduplicate against the failed record instead of
    /// re-resolving. A requested callback webhook is still delivered, with
    /// the unsuccessful terminal record as the body.
    async fn admit_unresolvable(
        &self,
        url: String,
        callback_webhook: Option<String>,
        cause: &Error,
    ) -> Result<TaskSnapshot> {
        let id = TaskId::new(url.clone());
        let (snapshot, is_new) = self.registry.admit_or_get(id.clone(), &url).await;
        if !is_new {
            self.emit_event(Event::TaskDeduplicated { id });
            return Ok(snapshot);
        }

        tracing::warn!(url = %url, error = %cause, "URL resolution failed, recording failed task");
        self.emit_event(Event::TaskAdmitted {
            id: id.clone(),
            url,
        });
        self.emit_event(Event::TaskFailed {
            id: id.clone(),
            error: cause.to_string(),
        });

        let finished = self.registry.finish(&id, TaskCompletion::Failed).await;
        self.emit_event(Event::TaskFinished {
            id,
            successful: false,
        });

        let finished = finished.unwrap_or(snapshot);
        if let Some(callback) = callback_webhook {
            self.queue_webhook(callback, finished.clone());
        }
        Ok(finished)
    }
}

/// Reject submissions the rest of the pipeline cannot act on
fn validate_request(request: &SubmitRequest) -> Result<()> {
    if request.url.trim().is_empty() {
        return Err(Error::InvalidRequest("url must not be empty".to_string()));
    }

    if let Some(callback) = &request.callback_webhook {
        let parsed = url::Url::parse(callback)
            .map_err(|e| Error::InvalidRequest(format!("invalid callback webhook: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::InvalidRequest(format!(
                "callback webhook must use http or https, got {}",
                parsed.scheme()
            )));
        }
    }

    Ok(())
}
