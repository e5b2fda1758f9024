use super::*;
use crate::manager::test_helpers::{FetchScript, ScriptedFetcher, create_test_manager_with_config};
use axum::body::Body;
use axum::http::Request;
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a router over a fresh test manager
async fn create_test_router(fetcher: Arc<ScriptedFetcher>) -> (Router, Arc<DownloadManager>) {
    let manager = Arc::new(create_test_manager_with_config(Config::default(), fetcher).await);
    let config = manager.get_config();
    let router = create_router(manager.clone(), config);
    (router, manager)
}

/// Read a response body to a string
async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read a response body as JSON
async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let fetcher = ScriptedFetcher::new(FetchScript::BlockUntilReleased);
    let mut config = Config::default();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let manager = Arc::new(create_test_manager_with_config(config, fetcher).await);

    let api_handle = manager.spawn_api_server();

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn test_api_server_stops_on_manager_shutdown() {
    let fetcher = ScriptedFetcher::new(FetchScript::BlockUntilReleased);
    let mut config = Config::default();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let manager = Arc::new(create_test_manager_with_config(config, fetcher).await);

    let api_handle = manager.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;

    manager.shutdown().await;

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop once the shutdown token cancels");
    result.unwrap().unwrap();
}

#[tokio::test]
async fn test_cors_headers_present_on_responses() {
    let fetcher = ScriptedFetcher::new(FetchScript::BlockUntilReleased);
    let (app, _manager) = create_test_router(fetcher).await;

    let request = Request::builder()
        .uri("/get-tasks")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "permissive CORS headers should be attached to every response"
    );
}

#[tokio::test]
async fn test_options_returns_200_on_registered_route() {
    let fetcher = ScriptedFetcher::new(FetchScript::BlockUntilReleased);
    let (app, _manager) = create_test_router(fetcher).await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/add-task")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint() {
    let fetcher = ScriptedFetcher::new(FetchScript::BlockUntilReleased);
    let (app, _manager) = create_test_router(fetcher).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
