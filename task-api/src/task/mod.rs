use crate::entities::task;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub mod api;
pub mod repository;
pub mod seed;
pub mod service;
pub mod status;

pub use repository::{TaskRepository, TaskRepositoryError};
pub use service::{TaskService, TaskServiceError};
pub use status::{InvalidStatusError, TaskStatus};

/// A persisted task.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: i32,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: i32,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status,
            created_at,
            updated_at,
        }
    }

    /// Returns the store-assigned ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns when the task was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task was last modified.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Refreshes the modification timestamp. `created_at` never moves.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.id,
            model.title,
            model.description,
            model.status.into(),
            model.created_at.with_timezone(&Utc),
            model.updated_at.with_timezone(&Utc),
        )
    }
}

/// A task that has not been stored yet.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to [`TaskStatus::Todo`] when unset.
    pub status: Option<TaskStatus>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Partial update applied on top of an existing task.
///
/// `None` means "leave untouched". A blank title is treated as absent, while
/// `Some(String::new())` as description clears it to the empty string.
#[derive(Debug, PartialEq, Clone, Eq, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

/// Task counts per status.
///
/// Each count is read independently, so under concurrent writes the numbers
/// are not guaranteed to add up to `total_count`.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub todo_count: u64,
    pub in_progress_count: u64,
    pub completed_count: u64,
    pub cancelled_count: u64,
    pub total_count: u64,
}
