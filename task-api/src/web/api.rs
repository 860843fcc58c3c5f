use std::sync::Arc;

use crate::task::TaskStatistics;
use crate::task::TaskStatus;
use crate::task::api::v1 as tasks_v1;
use crate::task::api::v1::TaskState;

use axum::Router;
use utoipa::OpenApi;

pub mod v1;

/// OpenAPI description of the JSON API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task Management API",
        description = "CRUD operations, search and statistics for tasks"
    ),
    paths(
        tasks_v1::get_tasks_handler,
        tasks_v1::get_task_handler,
        tasks_v1::create_task_handler,
        tasks_v1::update_task_handler,
        tasks_v1::delete_task_handler,
        tasks_v1::complete_task_handler,
        tasks_v1::get_statistics_handler,
        v1::health_check_handler,
        v1::ping_handler,
    ),
    components(schemas(
        tasks_v1::TaskJson,
        tasks_v1::CreateTaskRequest,
        tasks_v1::UpdateTaskRequest,
        TaskStatistics,
        TaskStatus,
        v1::ApiErrorResponse,
        v1::HealthJson,
    )),
    tags(
        (name = "Task Management", description = "APIs for managing tasks"),
        (name = "Health Check", description = "Health monitoring endpoints")
    )
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(task_state: Arc<TaskState>) -> axum::Router {
    let tasks_router = tasks_v1::create_api_router(task_state);
    let health_router = v1::create_health_router();
    let api_routes = tasks_router.merge(health_router);
    Router::new().nest("/api/v1", api_routes)
}
