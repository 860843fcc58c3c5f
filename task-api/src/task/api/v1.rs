use crate::task::{
    InvalidStatusError, NewTask, Task, TaskPatch, TaskService, TaskServiceError, TaskStatistics,
    TaskStatus,
};
use crate::web::api::v1::{ApiErrorResponse, ApiResponse, UNEXPECTED_ERROR_MESSAGE};
use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

const TITLE_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 500;

const TITLE_REQUIRED: &str = "Title is required";
const TITLE_LENGTH: &str = "Title must be between 1 and 100 characters";
const DESCRIPTION_LENGTH: &str = "Description cannot exceed 500 characters";

/// Shared state for the task endpoints.
#[derive(Clone)]
pub struct TaskState {
    pub service: TaskService,
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier for the task
    id: i32,
    /// Task title
    title: String,
    /// Optional longer description
    description: Option<String>,
    /// Machine name of the status, e.g. `IN_PROGRESS`
    status: TaskStatus,
    /// Human readable status, e.g. `In Progress`
    status_display: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            status: task.status(),
            status_display: task.status().display_name().to_string(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Request payload for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Required, 1 to 100 characters
    #[serde(default)]
    title: Option<String>,
    /// At most 500 characters
    #[serde(default)]
    description: Option<String>,
    /// Machine name or display label, defaults to `TODO`
    #[serde(default)]
    status: Option<String>,
}

impl CreateTaskRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match self.title.as_deref().map(str::trim) {
            None | Some("") => errors.add("title", TITLE_REQUIRED),
            Some(title) if title.chars().count() > TITLE_MAX_CHARS => {
                errors.add("title", TITLE_LENGTH)
            }
            Some(_) => {}
        }
        validate_description(self.description.as_deref(), &mut errors);
        errors.into_result()
    }

    fn into_new_task(self) -> Result<NewTask, TaskApiError> {
        self.validate()?;
        let status = TaskStatus::parse(self.status.as_deref())?;
        Ok(NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description,
            status: Some(status),
        })
    }
}

/// Request payload for updating a task. Absent fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    /// New title, 1 to 100 characters; whitespace only leaves the title unchanged
    #[serde(default)]
    title: Option<String>,
    /// New description; an empty string clears it
    #[serde(default)]
    description: Option<String>,
    /// New status; blank leaves the status unchanged
    #[serde(default)]
    status: Option<String>,
}

impl UpdateTaskRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        // An empty title is rejected; a whitespace-only one reaches the service and is ignored.
        if let Some(title) = self.title.as_deref() {
            if title.is_empty() || title.trim().chars().count() > TITLE_MAX_CHARS {
                errors.add("title", TITLE_LENGTH);
            }
        }
        validate_description(self.description.as_deref(), &mut errors);
        errors.into_result()
    }

    fn into_patch(self) -> Result<TaskPatch, TaskApiError> {
        self.validate()?;
        let status = self
            .status
            .as_deref()
            .filter(|status| !status.trim().is_empty())
            .map(|status| TaskStatus::parse(Some(status)))
            .transpose()?;
        Ok(TaskPatch {
            title: self.title,
            description: self.description,
            status,
        })
    }
}

fn validate_description(description: Option<&str>, errors: &mut ValidationErrors) {
    if description.is_some_and(|description| description.chars().count() > DESCRIPTION_MAX_CHARS)
    {
        errors.add("description", DESCRIPTION_LENGTH);
    }
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    /// Only return tasks with this status
    #[serde(default)]
    status: Option<String>,
    /// Only return tasks whose title or description contains this keyword
    #[serde(default)]
    search: Option<String>,
}

/// Field name to message for every field that failed validation.
#[derive(Debug, Default, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fields: {}", field_names(.0))]
pub struct ValidationErrors(BTreeMap<String, String>);

fn field_names(errors: &BTreeMap<String, String>) -> String {
    errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl ValidationErrors {
    fn add(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Custom error type for task API handlers.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// One or more request fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// A status string could not be parsed.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatusError),
    /// The request body was not valid JSON for the endpoint.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    /// Represents a failure raised by the task service.
    #[error(transparent)]
    Service(#[from] TaskServiceError),
}

impl From<JsonRejection> for TaskApiError {
    fn from(rejection: JsonRejection) -> Self {
        TaskApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        let (status_code, body) = match self {
            TaskApiError::Validation(errors) => {
                tracing::warn!("Validation failed: {}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    ApiErrorResponse::with_errors("Validation failed", errors.0),
                )
            }
            TaskApiError::InvalidStatus(err) => {
                tracing::warn!("Invalid argument: {}", err);
                (StatusCode::BAD_REQUEST, ApiErrorResponse::new(err.to_string()))
            }
            TaskApiError::MalformedBody(detail) => {
                tracing::warn!("Malformed request body: {}", detail);
                (
                    StatusCode::BAD_REQUEST,
                    ApiErrorResponse::new("Malformed request body"),
                )
            }
            TaskApiError::Service(err @ TaskServiceError::TaskNotFound(_)) => {
                tracing::warn!("Task not found: {}", err);
                (StatusCode::NOT_FOUND, ApiErrorResponse::new(err.to_string()))
            }
            TaskApiError::Service(err @ TaskServiceError::DuplicateTitle(_)) => {
                tracing::warn!("Duplicate task: {}", err);
                (StatusCode::CONFLICT, ApiErrorResponse::new(err.to_string()))
            }
            TaskApiError::Service(err) => {
                tracing::error!("Unexpected error while handling task request: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new(UNEXPECTED_ERROR_MESSAGE),
                )
            }
        };

        (status_code, Json(body)).into_response()
    }
}

fn to_json_list(tasks: Vec<Task>) -> Vec<TaskJson> {
    tasks.into_iter().map(TaskJson::from).collect()
}

/// Handler for GET /api/v1/tasks - Lists tasks, optionally searched or filtered by status.
///
/// A non-blank `search` wins over a non-blank `status`; with neither every task is returned.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(
        ("status" = Option<String>, Query, description = "Filter tasks by status (TODO, IN_PROGRESS, COMPLETED, CANCELLED)"),
        ("search" = Option<String>, Query, description = "Search tasks by title or description")
    ),
    responses(
        (status = 200, description = "Tasks retrieved successfully", body = ApiResponse<Vec<TaskJson>>),
        (status = 400, description = "Invalid status filter", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Task Management"
)]
pub async fn get_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<ApiResponse<Vec<TaskJson>>>, TaskApiError> {
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
    let status = query.status.as_deref().filter(|s| !s.trim().is_empty());

    let tasks = match (search, status) {
        (Some(keyword), _) => state.service.search_tasks(Some(keyword)).await?,
        (None, Some(status)) => {
            let status = TaskStatus::parse(Some(status))?;
            state.service.get_tasks_by_status(status).await?
        }
        (None, None) => state.service.get_all_tasks().await?,
    };

    Ok(Json(ApiResponse::success(
        to_json_list(tasks),
        "Tasks retrieved successfully",
    )))
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = ApiResponse<TaskJson>),
        (status = 404, description = "Task not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Task Management"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TaskJson>>, TaskApiError> {
    let task = state.service.get_task_by_id(id).await?;
    Ok(Json(ApiResponse::success(
        TaskJson::from(task),
        "Task retrieved successfully",
    )))
}

/// Handler for POST /api/v1/tasks - Creates a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created successfully", body = ApiResponse<TaskJson>),
        (status = 400, description = "Invalid input", body = ApiErrorResponse),
        (status = 409, description = "Task with title already exists", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Task Management"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TaskJson>>), TaskApiError> {
    let Json(request) = payload?;
    let task = state.service.create_task(request.into_new_task()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            TaskJson::from(task),
            "Task created successfully",
        )),
    ))
}

/// Handler for PUT /api/v1/tasks/{id} - Applies a partial update to a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = ApiResponse<TaskJson>),
        (status = 400, description = "Invalid input", body = ApiErrorResponse),
        (status = 404, description = "Task not found", body = ApiErrorResponse),
        (status = 409, description = "Task with title already exists", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Task Management"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TaskJson>>, TaskApiError> {
    let Json(request) = payload?;
    let task = state.service.update_task(id, request.into_patch()?).await?;
    Ok(Json(ApiResponse::success(
        TaskJson::from(task),
        "Task updated successfully",
    )))
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted successfully"),
        (status = 404, description = "Task not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Task Management"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, TaskApiError> {
    state.service.delete_task(id).await?;
    Ok(Json(ApiResponse::empty("Task deleted successfully")))
}

/// Handler for PATCH /api/v1/tasks/{id}/complete - Marks a task as completed.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}/complete",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task marked as completed", body = ApiResponse<TaskJson>),
        (status = 404, description = "Task not found", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Task Management"
)]
pub async fn complete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TaskJson>>, TaskApiError> {
    let task = state.service.complete_task(id).await?;
    Ok(Json(ApiResponse::success(
        TaskJson::from(task),
        "Task marked as completed",
    )))
}

/// Handler for GET /api/v1/tasks/statistics - Returns task counts per status.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/statistics",
    responses(
        (status = 200, description = "Statistics retrieved successfully", body = ApiResponse<TaskStatistics>),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Task Management"
)]
pub async fn get_statistics_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<ApiResponse<TaskStatistics>>, TaskApiError> {
    let statistics = state.service.get_task_statistics().await?;
    Ok(Json(ApiResponse::success(
        statistics,
        "Task statistics retrieved successfully",
    )))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(get_tasks_handler).post(create_task_handler))
        .route("/tasks/statistics", get(get_statistics_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/tasks/{id}/complete", patch(complete_task_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskRepositoryError;

    fn create_request(title: Option<&str>, description: Option<&str>) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            status: None,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn can_require_title_on_create() {
        let errors = create_request(None, None).validate().unwrap_err();
        assert_eq!(errors.0.get("title").map(String::as_str), Some(TITLE_REQUIRED));

        let errors = create_request(Some("   "), None).validate().unwrap_err();
        assert_eq!(errors.0.get("title").map(String::as_str), Some(TITLE_REQUIRED));
    }

    #[test]
    fn can_report_every_oversized_field() {
        let title = "t".repeat(101);
        let description = "d".repeat(501);
        let errors = create_request(Some(&title), Some(&description))
            .validate()
            .unwrap_err();

        assert_eq!(errors.0.get("title").map(String::as_str), Some(TITLE_LENGTH));
        assert_eq!(
            errors.0.get("description").map(String::as_str),
            Some(DESCRIPTION_LENGTH)
        );
    }

    #[test]
    fn can_name_failing_fields_in_error_message() {
        let errors = create_request(None, Some(&"d".repeat(501)))
            .validate()
            .unwrap_err();

        assert_eq!(errors.to_string(), "invalid fields: description, title");
    }

    #[test]
    fn can_accept_fields_at_their_limits() {
        let title = format!("  {}  ", "t".repeat(100));
        let description = "d".repeat(500);
        assert!(create_request(Some(&title), Some(&description)).validate().is_ok());
    }

    #[test]
    fn can_default_create_status_to_todo() {
        let new_task = CreateTaskRequest {
            title: Some("Write docs".to_string()),
            description: None,
            status: Some("  ".to_string()),
        }
        .into_new_task()
        .unwrap();

        assert_eq!(new_task.status, Some(TaskStatus::Todo));
    }

    #[test]
    fn can_leave_status_untouched_when_update_status_is_blank() {
        let patch = UpdateTaskRequest {
            title: Some("   ".to_string()),
            description: Some(String::new()),
            status: Some(String::new()),
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch.status, None);
        assert_eq!(patch.title, Some("   ".to_string()));
        assert_eq!(patch.description, Some(String::new()));
    }

    #[test]
    fn can_reject_empty_title_on_update() {
        let result = UpdateTaskRequest {
            title: Some(String::new()),
            description: None,
            status: None,
        }
        .validate();

        let errors = result.unwrap_err();
        assert_eq!(errors.0.get("title").map(String::as_str), Some(TITLE_LENGTH));
    }

    #[test]
    fn can_report_every_oversized_field_on_update() {
        let errors = UpdateTaskRequest {
            title: Some("t".repeat(101)),
            description: Some("d".repeat(501)),
            status: None,
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.0.get("title").map(String::as_str), Some(TITLE_LENGTH));
        assert_eq!(
            errors.0.get("description").map(String::as_str),
            Some(DESCRIPTION_LENGTH)
        );
    }

    #[test]
    fn can_reject_unknown_status_on_update() {
        let result = UpdateTaskRequest {
            title: None,
            description: None,
            status: Some("bogus".to_string()),
        }
        .into_patch();

        assert!(matches!(result, Err(TaskApiError::InvalidStatus(_))));
    }

    #[tokio::test]
    async fn can_map_validation_failure_to_bad_request_with_field_errors() {
        let errors = create_request(None, None).validate().unwrap_err();
        let response = TaskApiError::from(errors).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "success": false,
                "message": "Validation failed",
                "errors": { "title": "Title is required" }
            })
        );
    }

    #[tokio::test]
    async fn can_map_duplicate_title_to_conflict() {
        let err = TaskApiError::from(TaskServiceError::DuplicateTitle("Foo".to_string()));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await["message"],
            "Task with title 'Foo' already exists"
        );
    }

    #[tokio::test]
    async fn can_hide_internal_errors_behind_generic_message() {
        let err = TaskApiError::from(TaskServiceError::Repository(
            TaskRepositoryError::StoreUnavailable("lock poisoned".to_string()),
        ));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "success": false,
                "message": UNEXPECTED_ERROR_MESSAGE
            })
        );
    }
}
