use crate::task::repository::{TaskRepository, TaskRepositoryError};
use crate::task::{NewTask, Task, TaskPatch, TaskStatistics, TaskStatus};
use std::sync::Arc;

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a task not found error.
    #[error("Task not found with ID: {0}")]
    TaskNotFound(i32),
    /// Represents a title already held by another task.
    #[error("Task with title '{0}' already exists")]
    DuplicateTitle(String),
    /// Represents a persistence failure.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Business rules for creating, changing and querying tasks.
///
/// Every operation is a sequence of independent repository calls. Checks such
/// as title uniqueness are not isolated from concurrent writers.
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `task` - The task to store. A missing status defaults to `TODO`.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task` with its assigned ID, or
    /// `DuplicateTitle` when a task with exactly the same title exists.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, mut task: NewTask) -> Result<Task, TaskServiceError> {
        if self.repository.exists_by_title(&task.title).await? {
            tracing::warn!("Rejected duplicate task title '{}'", task.title);
            return Err(TaskServiceError::DuplicateTitle(task.title));
        }

        task.status = Some(task.status.unwrap_or_default());

        let saved_task = self.repository.insert(task).await?;
        tracing::info!("Created task with ID: {}", saved_task.id());
        Ok(saved_task)
    }

    /// Retrieves all tasks.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = self.repository.find_all().await?;
        tracing::debug!("Found {} tasks", tasks.len());
        Ok(tasks)
    }

    /// Retrieves a task by its ID.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Task`, or `TaskNotFound` if there is none.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: i32) -> Result<Task, TaskServiceError> {
        tracing::debug!("Retrieving task with ID: {}", id);
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Applies a partial update to an existing task.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `patch` - The fields to overwrite. A blank title is ignored, a present
    ///   description or status always overwrites.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task`, `TaskNotFound` if the task does
    /// not exist, or `DuplicateTitle` if another task already holds the new title.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, id: i32, patch: TaskPatch) -> Result<Task, TaskServiceError> {
        let mut existing_task = self.get_task_by_id(id).await?;

        if let Some(title) = patch.title.filter(|title| !title.trim().is_empty()) {
            if existing_task.title() != title {
                if self.repository.exists_by_title(&title).await? {
                    tracing::warn!("Rejected duplicate task title '{}'", title);
                    return Err(TaskServiceError::DuplicateTitle(title));
                }
                existing_task.set_title(title);
            }
        }

        if let Some(description) = patch.description {
            existing_task.set_description(Some(description));
        }

        if let Some(status) = patch.status {
            existing_task.set_status(status);
        }

        let saved_task = self.repository.update(existing_task).await?;
        tracing::info!("Updated task with ID: {}", saved_task.id());
        Ok(saved_task)
    }

    /// Hard-deletes a task by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: i32) -> Result<(), TaskServiceError> {
        if !self.repository.exists_by_id(id).await? {
            return Err(TaskServiceError::TaskNotFound(id));
        }

        self.repository.delete_by_id(id).await?;
        tracing::info!("Deleted task with ID: {}", id);
        Ok(())
    }

    /// Retrieves the tasks with the given status, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_tasks_by_status(
        &self,
        status: TaskStatus,
    ) -> Result<Vec<Task>, TaskServiceError> {
        tracing::debug!("Retrieving tasks with status: {}", status.name());
        Ok(self
            .repository
            .find_by_status_order_by_created_at_desc(status)
            .await?)
    }

    /// Searches titles and descriptions for a keyword, ignoring case.
    ///
    /// A missing or blank keyword returns every task.
    #[tracing::instrument(skip(self))]
    pub async fn search_tasks(&self, keyword: Option<&str>) -> Result<Vec<Task>, TaskServiceError> {
        match keyword.map(str::trim).filter(|keyword| !keyword.is_empty()) {
            Some(keyword) => {
                tracing::debug!("Searching tasks with keyword: {}", keyword);
                Ok(self.repository.search_by_keyword(keyword).await?)
            }
            None => self.get_all_tasks().await,
        }
    }

    /// Marks a task as completed, whatever its current status.
    #[tracing::instrument(skip(self))]
    pub async fn complete_task(&self, id: i32) -> Result<Task, TaskServiceError> {
        let mut task = self.get_task_by_id(id).await?;
        task.set_status(TaskStatus::Completed);

        let saved_task = self.repository.update(task).await?;
        tracing::info!("Marked task {} as completed", id);
        Ok(saved_task)
    }

    /// Counts tasks per status plus the overall total.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_statistics(&self) -> Result<TaskStatistics, TaskServiceError> {
        Ok(TaskStatistics {
            todo_count: self.repository.count_by_status(TaskStatus::Todo).await?,
            in_progress_count: self
                .repository
                .count_by_status(TaskStatus::InProgress)
                .await?,
            completed_count: self
                .repository
                .count_by_status(TaskStatus::Completed)
                .await?,
            cancelled_count: self
                .repository
                .count_by_status(TaskStatus::Cancelled)
                .await?,
            total_count: self.repository.count().await?,
        })
    }
}
