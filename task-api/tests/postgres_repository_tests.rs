use std::sync::Arc;
use task_api::task::repository::DatabaseTaskRepository;
use task_api::task::{NewTask, TaskPatch, TaskService, TaskServiceError, TaskStatus};

mod common;

// Needs a Docker daemon for the PostgreSQL container.
#[tokio::test]
#[ignore = "requires Docker"]
async fn can_manage_tasks_on_postgres() {
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container()
        .await
        .expect("Failed to start container");
    let db = common::setup_postgres_db(&container)
        .await
        .expect("Failed to setup database");
    let service = TaskService::new(Arc::new(DatabaseTaskRepository::new(Arc::new(db))));

    let created = service
        .create_task(NewTask::new("Ship it").with_description("50% of the work"))
        .await
        .unwrap();
    service
        .create_task(NewTask::new("Plan").with_status(TaskStatus::InProgress))
        .await
        .unwrap();

    let duplicate = service.create_task(NewTask::new("Ship it")).await;
    assert!(matches!(duplicate, Err(TaskServiceError::DuplicateTitle(_))));

    let found = service.search_tasks(Some("50%")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), created.id());

    let patch = TaskPatch {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };
    let updated = service.update_task(created.id(), patch).await.unwrap();
    assert_eq!(updated.status(), TaskStatus::Completed);
    assert_eq!(updated.title(), "Ship it");

    let statistics = service.get_task_statistics().await.unwrap();
    assert_eq!(statistics.completed_count, 1);
    assert_eq!(statistics.in_progress_count, 1);
    assert_eq!(statistics.total_count, 2);

    service.delete_task(created.id()).await.unwrap();
    assert!(matches!(
        service.get_task_by_id(created.id()).await,
        Err(TaskServiceError::TaskNotFound(_))
    ));
}
