//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the vod-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the vod-dl REST API
///
/// This struct is used to generate the specification describing all
/// available endpoints, request/response types, and API behavior. The spec
/// is served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "vod-dl REST API",
        version = "0.1.0",
        description = "REST API for submitting asynchronous media download tasks and polling their state",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:58682", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::list_tasks,
        crate::api::routes::list_running,
        crate::api::routes::list_finished,
        crate::api::routes::get_task,
        crate::api::routes::submit_task,
        crate::api::routes::clear_finished,
        crate::api::routes::clear_failed,
        crate::api::routes::remove_finished_by_id,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::TaskId,
        crate::types::TaskSnapshot,
        crate::types::TaskCollection,
        crate::types::TaskOptions,
        crate::types::SubmitRequest,
        crate::types::Event,
    )),
    tags(
        (name = "tasks", description = "Task submission, listing and purge operations"),
        (name = "system", description = "Health, event streaming and API documentation")
    )
)]
pub struct ApiDoc;
