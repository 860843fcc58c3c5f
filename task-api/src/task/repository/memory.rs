use super::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
use crate::task::{NewTask, Task, TaskStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    // Keyed by ID, so iteration order is insertion order.
    tasks: BTreeMap<i32, Task>,
    last_id: i32,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::StoreUnavailable(err.to_string()))
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::StoreUnavailable(err.to_string()))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        state.last_id += 1;
        let now = Utc::now();
        let created = Task::new(
            state.last_id,
            task.title,
            task.description,
            task.status.unwrap_or_default(),
            now,
            now,
        );
        state.tasks.insert(created.id(), created.clone());
        Ok(created)
    }

    async fn update(&self, mut task: Task) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;

        // The stored creation time wins over whatever the caller carries.
        task = Task::new(
            task.id(),
            task.title().to_string(),
            task.description().map(str::to_string),
            task.status(),
            stored.created_at(),
            task.updated_at(),
        );
        task.touch(Utc::now());
        *stored = task.clone();
        Ok(task)
    }

    async fn find_by_id(&self, id: i32) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i32) -> TaskRepositoryResult<bool> {
        Ok(self.read()?.tasks.contains_key(&id))
    }

    async fn delete_by_id(&self, id: i32) -> TaskRepositoryResult<()> {
        self.write()?.tasks.remove(&id);
        Ok(())
    }

    async fn find_all(&self) -> TaskRepositoryResult<Vec<Task>> {
        Ok(self.read()?.tasks.values().cloned().collect())
    }

    async fn find_by_status_order_by_created_at_desc(
        &self,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .read()?
            .tasks
            .values()
            .filter(|task| task.status() == status)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(tasks)
    }

    async fn exists_by_title(&self, title: &str) -> TaskRepositoryResult<bool> {
        Ok(self.read()?.tasks.values().any(|task| task.title() == title))
    }

    async fn count_by_status(&self, status: TaskStatus) -> TaskRepositoryResult<u64> {
        let count = self
            .read()?
            .tasks
            .values()
            .filter(|task| task.status() == status)
            .count();
        Ok(count as u64)
    }

    async fn count(&self) -> TaskRepositoryResult<u64> {
        Ok(self.read()?.tasks.len() as u64)
    }

    async fn search_by_keyword(&self, keyword: &str) -> TaskRepositoryResult<Vec<Task>> {
        let needle = keyword.to_lowercase();
        let tasks = self
            .read()?
            .tasks
            .values()
            .filter(|task| {
                contains_ignore_case(task.title(), &needle)
                    || task
                        .description()
                        .is_some_and(|description| contains_ignore_case(description, &needle))
            })
            .cloned()
            .collect();
        Ok(tasks)
    }
}
