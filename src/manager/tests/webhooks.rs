use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::manager::test_helpers::{
    FetchScript, ScriptedFetcher, create_test_manager, sample_media, submit_request,
    wait_for_finished,
};
use crate::types::Event;

/// Poll the mock server until it has received `count` requests.
///
/// Delivery happens on the notifier task after TaskFinished, so tests cannot
/// assert immediately.
async fn wait_for_requests(server: &MockServer, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let received = server.received_requests().await.unwrap_or_default();
            if received.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    })
    .await
    .expect("timed out waiting for webhook delivery");
}

#[tokio::test]
async fn test_webhook_delivered_once_on_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/done"))
        .and(body_partial_json(json!({
            "id": "id-hook1",
            "isSuccessful": true,
            "progress": 1.0,
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = ScriptedFetcher::new(FetchScript::Succeed(sample_media()));
    let manager = create_test_manager(fetcher).await;
    let mut events = manager.subscribe();

    let mut request = submit_request("https://example.com/watch/hook1");
    request.callback_webhook = Some(format!("{}/hooks/done", mock_server.uri()));
    let admitted = manager.submit(request).await.unwrap();

    wait_for_finished(&mut events, &admitted.id).await;
    wait_for_requests(&mock_server, 1).await;

    // Expectations (exactly one POST, matching body) checked here
    mock_server.verify().await;
}

#[tokio::test]
async fn test_webhook_delivered_for_failed_task_too() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/done"))
        .and(body_partial_json(json!({ "isSuccessful": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = ScriptedFetcher::new(FetchScript::Fail("stream vanished".to_string()));
    let manager = create_test_manager(fetcher).await;
    let mut events = manager.subscribe();

    let mut request = submit_request("https://example.com/watch/hook2");
    request.callback_webhook = Some(format!("{}/hooks/done", mock_server.uri()));
    let admitted = manager.submit(request).await.unwrap();

    wait_for_finished(&mut events, &admitted.id).await;
    wait_for_requests(&mock_server, 1).await;

    mock_server.verify().await;
}

#[tokio::test]
async fn test_webhook_delivered_when_resolution_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/done"))
        .and(body_partial_json(json!({ "isSuccessful": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = ScriptedFetcher::new(FetchScript::Succeed(sample_media()));
    let manager = create_test_manager(fetcher).await;

    let mut request = submit_request("https://example.com/unresolvable/hook6");
    request.callback_webhook = Some(format!("{}/hooks/done", mock_server.uri()));
    let snapshot = manager.submit(request).await.unwrap();
    assert!(
        snapshot.finished_at.is_some(),
        "unresolvable URL lands directly in finished"
    );

    wait_for_requests(&mock_server, 1).await;

    // The requested callback fires even though no fetch job ever ran
    mock_server.verify().await;
}

#[tokio::test]
async fn test_webhook_rejection_emits_event_without_retry() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let fetcher = ScriptedFetcher::new(FetchScript::Succeed(sample_media()));
    let manager = create_test_manager(fetcher).await;
    let mut events = manager.subscribe();

    let hook_url = format!("{}/hooks/done", mock_server.uri());
    let mut request = submit_request("https://example.com/watch/hook3");
    request.callback_webhook = Some(hook_url.clone());
    manager.submit(request).await.unwrap();

    let failure = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(Event::WebhookFailed { url, error }) => return (url, error),
                Ok(_) => {}
                Err(e) => panic!("event channel closed: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for WebhookFailed");

    assert_eq!(failure.0, hook_url);
    assert!(
        failure.1.contains("500"),
        "error should carry the status, got: {}",
        failure.1
    );

    // No retry: the request count stays at one
    tokio::time::sleep(Duration::from_millis(200)).await;
    let received = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1, "a rejected webhook is not retried");
}

#[tokio::test]
async fn test_unreachable_webhook_does_not_disturb_task_state() {
    let fetcher = ScriptedFetcher::new(FetchScript::Succeed(sample_media()));
    let manager = create_test_manager(fetcher).await;
    let mut events = manager.subscribe();

    // Port 1 refuses connections
    let mut request = submit_request("https://example.com/watch/hook4");
    request.callback_webhook = Some("http://127.0.0.1:1/hooks/done".to_string());
    let admitted = manager.submit(request).await.unwrap();

    let successful = wait_for_finished(&mut events, &admitted.id).await;
    assert!(successful, "delivery failure must not affect the task outcome");

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(Event::WebhookFailed { .. }) = events.recv().await {
                return;
            }
        }
    })
    .await
    .expect("timed out waiting for WebhookFailed");

    let snapshot = manager.registry.get(admitted.id.as_str()).await.unwrap();
    assert!(snapshot.successful, "record stays successful after failed delivery");
}

#[tokio::test]
async fn test_no_callback_means_no_post() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = ScriptedFetcher::new(FetchScript::Succeed(sample_media()));
    let manager = create_test_manager(fetcher).await;
    let mut events = manager.subscribe();

    let admitted = manager
        .submit(submit_request("https://example.com/watch/hook5"))
        .await
        .unwrap();
    wait_for_finished(&mut events, &admitted.id).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    mock_server.verify().await;
}
