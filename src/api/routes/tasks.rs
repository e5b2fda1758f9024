//! Task listing, submission and purge handlers.

use crate::api::AppState;
use crate::error::Error;
use crate::types::{SubmitRequest, TaskCollection, TaskSnapshot};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /get-tasks - List running and finished tasks
#[utoipa::path(
    get,
    path = "/get-tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "Both task collections", body = TaskCollection)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> Json<TaskCollection> {
    Json(state.manager.registry.all().await)
}

/// GET /get-tasks/running - List running tasks only
#[utoipa::path(
    get,
    path = "/get-tasks/running",
    tag = "tasks",
    responses(
        (status = 200, description = "Tasks admitted but not yet terminal", body = Vec<TaskSnapshot>)
    )
)]
pub async fn list_running(State(state): State<AppState>) -> Json<Vec<TaskSnapshot>> {
    Json(state.manager.registry.running().await)
}

/// GET /get-tasks/finished - List finished tasks only
#[utoipa::path(
    get,
    path = "/get-tasks/finished",
    tag = "tasks",
    responses(
        (status = 200, description = "Terminal tasks, successful or not", body = Vec<TaskSnapshot>)
    )
)]
pub async fn list_finished(State(state): State<AppState>) -> Json<Vec<TaskSnapshot>> {
    Json(state.manager.registry.finished().await)
}

/// GET /get-tasks/:id - Get a single task by id
#[utoipa::path(
    get,
    path = "/get-tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Canonical task identifier")
    ),
    responses(
        (status = 200, description = "Task record", body = TaskSnapshot),
        (status = 404, description = "No task with this id in either collection")
    )
)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.manager.registry.get(&id).await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// POST /add-task - Submit a URL for download
///
/// The response acknowledges admission only; the job itself runs detached.
/// Clients poll `/get-tasks/{id}` (or subscribe to `/events`) to learn the
/// outcome.
#[utoipa::path(
    post,
    path = "/add-task",
    tag = "tasks",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Task admitted or already known", body = String),
        (status = 400, description = "Malformed request body"),
        (status = 503, description = "Shutdown in progress")
    )
)]
pub async fn submit_task(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, Error> {
    // Decode by hand so malformed bodies answer with our message format
    let request: SubmitRequest =
        serde_json::from_slice(&body).map_err(|e| Error::InvalidRequest(e.to_string()))?;

    state.manager.submit(request).await?;
    Ok("OK")
}

/// GET /remove-finished - Clear all finished tasks
#[utoipa::path(
    get,
    path = "/remove-finished",
    tag = "tasks",
    responses(
        (status = 200, description = "Finished collection emptied", body = String)
    )
)]
pub async fn clear_finished(State(state): State<AppState>) -> &'static str {
    let removed = state.manager.registry.clear_finished().await;
    tracing::debug!(removed, "cleared finished tasks");
    "OK"
}

/// GET /remove-finished/failed - Clear unsuccessful finished tasks
#[utoipa::path(
    get,
    path = "/remove-finished/failed",
    tag = "tasks",
    responses(
        (status = 200, description = "Unsuccessful finished tasks removed", body = String)
    )
)]
pub async fn clear_failed(State(state): State<AppState>) -> &'static str {
    let removed = state
        .manager
        .registry
        .clear_finished_matching(|record| !record.successful)
        .await;
    tracing::debug!(removed, "cleared failed tasks");
    "OK"
}

/// GET /remove-finished/:id - Remove one finished task by id
///
/// Removing an id that is not in the finished collection is a no-op that
/// still answers OK.
#[utoipa::path(
    get,
    path = "/remove-finished/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Canonical task identifier")
    ),
    responses(
        (status = 200, description = "Record removed if present", body = String)
    )
)]
pub async fn remove_finished_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> &'static str {
    let removed = state
        .manager
        .registry
        .clear_finished_matching(|record| record.id == *id)
        .await;
    tracing::debug!(task_id = %id, removed, "removed finished task by id");
    "OK"
}
