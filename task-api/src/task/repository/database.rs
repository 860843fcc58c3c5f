use super::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
use crate::entities::task;
use crate::task::{NewTask, Task, TaskStatus};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use std::sync::Arc;

/// Task repository backed by a sea-orm database connection.
#[derive(Clone, Debug)]
pub struct DatabaseTaskRepository {
    db: Arc<DatabaseConnection>,
}

impl DatabaseTaskRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}

/// Escapes LIKE wildcards so the keyword is matched literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl TaskRepository for DatabaseTaskRepository {
    #[tracing::instrument(skip(self))]
    async fn insert(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let now = Utc::now();
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(task.title),
            description: ActiveValue::Set(task.description),
            status: ActiveValue::Set(task.status.unwrap_or_default().into()),
            created_at: ActiveValue::Set(now.into()),
            updated_at: ActiveValue::Set(now.into()),
            ..Default::default()
        };
        let created_model = active_model.insert(self.conn()).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, mut task: Task) -> TaskRepositoryResult<Task> {
        task.touch(Utc::now());
        let id = task.id();
        let active_model = task::ActiveModel {
            id: ActiveValue::Unchanged(id),
            title: ActiveValue::Set(task.title().to_string()),
            description: ActiveValue::Set(task.description().map(str::to_string)),
            status: ActiveValue::Set(task.status().into()),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::Set(task.updated_at().into()),
        };

        match active_model.update(self.conn()).await {
            Ok(updated_model) => Ok(Task::from(updated_model)),
            Err(DbErr::RecordNotUpdated) => Err(TaskRepositoryError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> TaskRepositoryResult<Option<Task>> {
        let task_model = task::Entity::find_by_id(id).one(self.conn()).await?;
        Ok(task_model.map(Task::from))
    }

    #[tracing::instrument(skip(self))]
    async fn exists_by_id(&self, id: i32) -> TaskRepositoryResult<bool> {
        let count = task::Entity::find()
            .filter(task::Column::Id.eq(id))
            .count(self.conn())
            .await?;
        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: i32) -> TaskRepositoryResult<()> {
        task::Entity::delete_by_id(id).exec(self.conn()).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = task::Entity::find()
            .order_by_asc(task::Column::Id)
            .all(self.conn())
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_status_order_by_created_at_desc(
        &self,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let status: crate::entities::sea_orm_active_enums::TaskStatus = status.into();
        let tasks = task::Entity::find()
            .filter(task::Column::Status.eq(status))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(self.conn())
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn exists_by_title(&self, title: &str) -> TaskRepositoryResult<bool> {
        let existing_task = task::Entity::find()
            .filter(task::Column::Title.eq(title))
            .one(self.conn())
            .await?;
        Ok(existing_task.is_some())
    }

    #[tracing::instrument(skip(self))]
    async fn count_by_status(&self, status: TaskStatus) -> TaskRepositoryResult<u64> {
        let status: crate::entities::sea_orm_active_enums::TaskStatus = status.into();
        let count = task::Entity::find()
            .filter(task::Column::Status.eq(status))
            .count(self.conn())
            .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self) -> TaskRepositoryResult<u64> {
        Ok(task::Entity::find().count(self.conn()).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn search_by_keyword(&self, keyword: &str) -> TaskRepositoryResult<Vec<Task>> {
        let pattern = format!("%{}%", escape_like(&keyword.to_lowercase()));
        let title_matches = Expr::expr(Func::lower(Expr::col(task::Column::Title)))
            .like(LikeExpr::new(pattern.clone()).escape('\\'));
        let description_matches = Expr::expr(Func::lower(Expr::col(task::Column::Description)))
            .like(LikeExpr::new(pattern).escape('\\'));

        let tasks = task::Entity::find()
            .filter(
                Condition::any()
                    .add(title_matches)
                    .add(description_matches),
            )
            .order_by_asc(task::Column::Id)
            .all(self.conn())
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_escape_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
