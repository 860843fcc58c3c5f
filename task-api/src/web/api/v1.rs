use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Message returned for any failure whose details must stay on the server.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// JSON envelope for successful API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true` for successful responses
    success: bool,
    /// Human readable outcome
    message: String,
    /// Response payload, `null` when the operation has nothing to return
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// JSON envelope for failed API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Always `false` for failures
    success: bool,
    /// Human readable reason
    message: String,
    /// Field name to validation message, only present for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: BTreeMap<String, String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: Some(errors),
        }
    }
}

/// Health payload reported by `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthJson {
    status: String,
    timestamp: DateTime<Utc>,
    application: String,
    version: String,
}

/// Handler for GET /api/v1/health - Reports that the service is up.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Application is healthy", body = ApiResponse<HealthJson>)
    ),
    tag = "Health Check"
)]
pub async fn health_check_handler() -> Json<ApiResponse<HealthJson>> {
    let health = HealthJson {
        status: "UP".to_string(),
        timestamp: Utc::now(),
        application: "Task Management API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Json(ApiResponse::success(health, "Application is healthy"))
}

/// Handler for GET /api/v1/health/ping - Answers with `pong`.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/api/v1/health/ping",
    responses(
        (status = 200, description = "Service is responding", body = ApiResponse<String>)
    ),
    tag = "Health Check"
)]
pub async fn ping_handler() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success(
        "pong".to_string(),
        "Service is responding",
    ))
}

/// Creates the health check router.
pub fn create_health_router() -> Router {
    Router::new()
        .route("/health", get(health_check_handler))
        .route("/health/ping", get(ping_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_serialize_empty_success_with_null_data() {
        let response: ApiResponse<String> = ApiResponse::empty("Task deleted successfully");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "message": "Task deleted successfully",
                "data": null
            })
        );
    }

    #[test]
    fn can_omit_errors_when_there_are_none() {
        let json = serde_json::to_value(ApiErrorResponse::new("Task not found with ID: 1")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "message": "Task not found with ID: 1"
            })
        );
    }
}
