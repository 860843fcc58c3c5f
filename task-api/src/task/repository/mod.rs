//! Persistence port for tasks, with a sea-orm backed and an in-memory adapter.

use crate::task::{NewTask, Task, TaskStatus};
use async_trait::async_trait;

mod database;
mod memory;

pub use database::DatabaseTaskRepository;
pub use memory::InMemoryTaskRepository;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Errors returned by task repository implementations.
#[derive(Debug, thiserror::Error)]
pub enum TaskRepositoryError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// The task to update no longer exists.
    #[error("Task with ID {0} does not exist in the store")]
    NotFound(i32),
    /// The in-memory store lock was poisoned by a panicking writer.
    #[error("Task store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Task persistence contract.
///
/// Each call is its own unit of work; nothing here spans several calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task, assigning its ID and setting both timestamps to now.
    async fn insert(&self, task: NewTask) -> TaskRepositoryResult<Task>;

    /// Persists changes to an existing task and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: Task) -> TaskRepositoryResult<Task>;

    /// Finds a task by ID. Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: i32) -> TaskRepositoryResult<Option<Task>>;

    async fn exists_by_id(&self, id: i32) -> TaskRepositoryResult<bool>;

    /// Hard-deletes a task. Deleting a missing ID is not an error.
    async fn delete_by_id(&self, id: i32) -> TaskRepositoryResult<()>;

    /// Returns every task in insertion order.
    async fn find_all(&self) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks with the given status, newest first.
    async fn find_by_status_order_by_created_at_desc(
        &self,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Exact, case-sensitive title match.
    async fn exists_by_title(&self, title: &str) -> TaskRepositoryResult<bool>;

    async fn count_by_status(&self, status: TaskStatus) -> TaskRepositoryResult<u64>;

    async fn count(&self) -> TaskRepositoryResult<u64>;

    /// Case-insensitive substring match against the title or the description.
    async fn search_by_keyword(&self, keyword: &str) -> TaskRepositoryResult<Vec<Task>>;
}
