//! Completion webhook delivery.
//!
//! Finished tasks with a callback URL are queued onto an unbounded channel
//! and drained by a single notifier task, so a slow or unreachable endpoint
//! never blocks the fetch pipeline. Each notification is one POST attempt
//! with the terminal record as the JSON body; failures are logged and
//! surfaced as events, never retried.

use tokio::sync::{broadcast, mpsc};

use crate::error::{Error, Result};
use crate::types::{Event, TaskSnapshot};

use super::DownloadManager;

/// A queued notification for one finished task
#[derive(Debug, Clone)]
pub(crate) struct WebhookDelivery {
    /// Destination URL from the original submission
    pub(crate) url: String,
    /// Terminal record snapshot sent as the request body
    pub(crate) snapshot: TaskSnapshot,
}

impl DownloadManager {
    /// Hand a finished task off to the notifier task (fire and forget)
    pub(crate) fn queue_webhook(&self, url: String, snapshot: TaskSnapshot) {
        if self
            .webhook_tx
            .send(WebhookDelivery { url, snapshot })
            .is_err()
        {
            tracing::warn!("webhook notifier task is gone, dropping notification");
        }
    }
}

/// Spawn the notifier task draining the webhook queue
///
/// The task runs until every sender handle is dropped, which happens when
/// the last manager clone goes away.
pub(crate) fn spawn_notifier(
    mut rx: mpsc::UnboundedReceiver<WebhookDelivery>,
    timeout: std::time::Duration,
    event_tx: broadcast::Sender<Event>,
) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        while let Some(delivery) = rx.recv().await {
            let url = delivery.url.clone();
            match deliver(&client, timeout, delivery).await {
                Ok(()) => {
                    tracing::debug!(url = %url, "webhook sent successfully");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "webhook failed");
                    event_tx
                        .send(Event::WebhookFailed {
                            url,
                            error: e.to_string(),
                        })
                        .ok();
                }
            }
        }
    });
}

/// Send one webhook POST, bounded by the configured timeout
async fn deliver(
    client: &reqwest::Client,
    timeout: std::time::Duration,
    delivery: WebhookDelivery,
) -> Result<()> {
    let request = client.post(&delivery.url).json(&delivery.snapshot);
    let response = tokio::time::timeout(timeout, request.send())
        .await
        .map_err(|_| Error::Other(format!("webhook timed out after {timeout:?}")))??;

    if !response.status().is_success() {
        return Err(Error::Other(format!(
            "webhook returned status {}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        )));
    }

    Ok(())
}
