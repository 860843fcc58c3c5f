use crate::task::{NewTask, TaskService, TaskServiceError, TaskStatus};

const SAMPLE_TASKS: [(&str, &str, TaskStatus); 10] = [
    (
        "Complete project documentation",
        "Write comprehensive API documentation with examples and usage guides",
        TaskStatus::Todo,
    ),
    (
        "Implement user authentication",
        "Add JWT-based authentication system for secure API access",
        TaskStatus::InProgress,
    ),
    (
        "Set up CI/CD pipeline",
        "Configure GitHub Actions for automated testing and deployment",
        TaskStatus::Todo,
    ),
    (
        "Database optimization",
        "Optimize database queries and add proper indexing",
        TaskStatus::InProgress,
    ),
    (
        "Write unit tests",
        "Implement comprehensive unit tests for all service methods",
        TaskStatus::Completed,
    ),
    (
        "Deploy to production",
        "Deploy the application to AWS ECS with proper monitoring",
        TaskStatus::Todo,
    ),
    (
        "Security audit",
        "Conduct thorough security audit and fix vulnerabilities",
        TaskStatus::Cancelled,
    ),
    (
        "Performance testing",
        "Run load tests and optimize application performance",
        TaskStatus::Todo,
    ),
    (
        "Code review process",
        "Establish code review guidelines and implement peer review process",
        TaskStatus::Completed,
    ),
    (
        "API versioning strategy",
        "Define and implement API versioning strategy for backward compatibility",
        TaskStatus::InProgress,
    ),
];

/// Fills an empty store with a fixed set of sample tasks.
///
/// Does nothing when any task already exists.
///
/// # Returns
///
/// A `Result` containing the number of tasks created.
#[tracing::instrument(skip(service))]
pub async fn seed_sample_tasks(service: &TaskService) -> Result<usize, TaskServiceError> {
    let statistics = service.get_task_statistics().await?;
    if statistics.total_count > 0 {
        tracing::info!("Data already exists, skipping sample data initialization");
        return Ok(0);
    }

    for (title, description, status) in SAMPLE_TASKS {
        let task = service
            .create_task(
                NewTask::new(title)
                    .with_description(description)
                    .with_status(status),
            )
            .await?;
        tracing::debug!("Created sample task: {}", task.title());
    }

    tracing::info!(
        "Sample data initialization completed. Total tasks: {}",
        SAMPLE_TASKS.len()
    );
    Ok(SAMPLE_TASKS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::repository::InMemoryTaskRepository;
    use std::sync::Arc;

    #[tokio::test]
    async fn can_seed_empty_store_once() {
        let service = TaskService::new(Arc::new(InMemoryTaskRepository::new()));

        assert_eq!(seed_sample_tasks(&service).await.unwrap(), 10);
        assert_eq!(seed_sample_tasks(&service).await.unwrap(), 0);

        let statistics = service.get_task_statistics().await.unwrap();
        assert_eq!(statistics.todo_count, 4);
        assert_eq!(statistics.in_progress_count, 3);
        assert_eq!(statistics.completed_count, 2);
        assert_eq!(statistics.cancelled_count, 1);
        assert_eq!(statistics.total_count, 10);
    }
}
