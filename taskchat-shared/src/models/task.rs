/// Task model and database operations
///
/// A task is a todo item owned by exactly one user.
///
/// # Lifecycle
///
/// ```text
/// (create) → pending ⇄ completed
///               ↓ ↑       ↓
///             archived ←──┘
/// ```
///
/// Tasks are always created `pending`. Status only changes through an explicit
/// update (or [`Task::complete`]); nothing in the system moves a task back on
/// its own.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status VARCHAR(20) NOT NULL DEFAULT 'pending',
///     priority SMALLINT NOT NULL DEFAULT 0,      -- -1 low, 0 normal, 1 high
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```
///
/// # Ordering
///
/// Lists return the most relevant tasks first: higher priority, then earlier
/// due date (tasks without one last), then newest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use super::{double_option, push_assignment};
use crate::constants::{
    TASK_PRIORITY_HIGH, TASK_PRIORITY_LOW, TASK_PRIORITY_NORMAL, TASK_STATUS_ARCHIVED,
    TASK_STATUS_COMPLETED, TASK_STATUS_PENDING,
};

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, priority, due_date, created_at, updated_at";

const TASK_ORDER: &str = "priority DESC, due_date ASC NULLS LAST, created_at DESC, id";

/// Error returned when a stored status or priority is outside its domain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskValueError {
    #[error("Unknown task status: {0}")]
    UnknownStatus(String),

    #[error("Unknown task priority: {0}")]
    UnknownPriority(i16),
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Open task (initial state)
    Pending,

    /// Done
    Completed,

    /// Hidden from the active list but kept
    Archived,
}

impl TaskStatus {
    /// Converts status to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => TASK_STATUS_PENDING,
            TaskStatus::Completed => TASK_STATUS_COMPLETED,
            TaskStatus::Archived => TASK_STATUS_ARCHIVED,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = TaskValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            TASK_STATUS_PENDING => Ok(TaskStatus::Pending),
            TASK_STATUS_COMPLETED => Ok(TaskStatus::Completed),
            TASK_STATUS_ARCHIVED => Ok(TaskStatus::Archived),
            _ => Err(TaskValueError::UnknownStatus(value)),
        }
    }
}

/// Task priority, ordered low < normal < high
///
/// Serialized by name, stored as a SMALLINT (-1, 0, 1) so the database can
/// sort on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

impl TaskPriority {
    /// Stored integer value
    pub fn as_i16(&self) -> i16 {
        match self {
            TaskPriority::Low => TASK_PRIORITY_LOW,
            TaskPriority::Normal => TASK_PRIORITY_NORMAL,
            TaskPriority::High => TASK_PRIORITY_HIGH,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Normal
    }
}

impl TryFrom<i16> for TaskPriority {
    type Error = TaskValueError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            TASK_PRIORITY_LOW => Ok(TaskPriority::Low),
            TASK_PRIORITY_NORMAL => Ok(TaskPriority::Normal),
            TASK_PRIORITY_HIGH => Ok(TaskPriority::High),
            other => Err(TaskValueError::UnknownPriority(other)),
        }
    }
}

/// Task row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Short title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Current status
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    /// Priority
    #[sqlx(try_from = "i16")]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskRead {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Input for creating a task
///
/// There is no status field: new tasks always start pending.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    /// Defaults to normal
    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update for a task
///
/// Only present fields are written. Nullable columns take `null` to clear.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTask {
    /// True when the patch carries no fields
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Builds the owner-scoped UPDATE statement for the fields present
    ///
    /// `$1` is the task id, `$2` the owner id and `$3` the new `updated_at`;
    /// field values follow in declaration order.
    pub fn set_clause(&self) -> String {
        let mut query = String::from("UPDATE tasks SET updated_at = $3");
        let mut bind_count = 3;

        if self.title.is_some() {
            push_assignment(&mut query, &mut bind_count, "title");
        }
        if self.description.is_some() {
            push_assignment(&mut query, &mut bind_count, "description");
        }
        if self.status.is_some() {
            push_assignment(&mut query, &mut bind_count, "status");
        }
        if self.priority.is_some() {
            push_assignment(&mut query, &mut bind_count, "priority");
        }
        if self.due_date.is_some() {
            push_assignment(&mut query, &mut bind_count, "due_date");
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {}",
            TASK_COLUMNS
        ));
        query
    }
}

/// Optional filters for task listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl Task {
    /// Creates a new pending task for `user_id`
    pub async fn create(pool: &PgPool, user_id: Uuid, data: CreateTask) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, user_id, title, description, status, priority, due_date,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(TaskStatus::Pending.as_str())
        .bind(data.priority.unwrap_or_default().as_i16())
        .bind(data.due_date)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID regardless of owner
    ///
    /// Used to tell "missing" (404) from "someone else's" (403).
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID owned by `user_id`
    pub async fn find_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a user's tasks, most relevant first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE user_id = $1
              AND ($2::VARCHAR IS NULL OR status = $2)
              AND ($3::SMALLINT IS NULL OR priority = $3)
            ORDER BY {}
            LIMIT $4 OFFSET $5
            "#,
            TASK_COLUMNS, TASK_ORDER
        ))
        .bind(user_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.priority.map(|p| p.as_i16()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts a user's tasks matching `filter`
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: TaskFilter,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE user_id = $1
              AND ($2::VARCHAR IS NULL OR status = $2)
              AND ($3::SMALLINT IS NULL OR priority = $3)
            "#,
        )
        .bind(user_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.priority.map(|p| p.as_i16()))
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Applies a partial update to a task owned by `user_id`
    ///
    /// Only fields present in `data` are written; `updated_at` is always
    /// refreshed.
    ///
    /// # Returns
    ///
    /// The updated task, or None if no such task belongs to the user
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = data.set_clause();

        let mut q = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .bind(Utc::now());

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority.as_i16());
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Marks a task completed
    pub async fn complete(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        Self::update(pool, id, user_id, update).await
    }

    /// Deletes a task owned by `user_id`
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Archived.as_str(), "archived");
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
    }

    #[test]
    fn test_task_status_try_from() {
        assert_eq!(
            TaskStatus::try_from("completed".to_string()),
            Ok(TaskStatus::Completed)
        );
        assert_eq!(
            TaskStatus::try_from("done".to_string()),
            Err(TaskValueError::UnknownStatus("done".to_string()))
        );
    }

    #[test]
    fn test_task_status_serde() {
        let status: TaskStatus = serde_json::from_str(r#""archived""#).unwrap();
        assert_eq!(status, TaskStatus::Archived);
        assert_eq!(serde_json::to_string(&TaskStatus::Pending).unwrap(), r#""pending""#);
        assert!(serde_json::from_str::<TaskStatus>(r#""Pending""#).is_err());
    }

    #[test]
    fn test_task_priority_is_ordered() {
        assert!(TaskPriority::Low < TaskPriority::Normal);
        assert!(TaskPriority::Normal < TaskPriority::High);
        assert!(TaskPriority::Low.as_i16() < TaskPriority::Normal.as_i16());
        assert!(TaskPriority::Normal.as_i16() < TaskPriority::High.as_i16());
        assert_eq!(TaskPriority::default(), TaskPriority::Normal);
    }

    #[test]
    fn test_task_priority_try_from() {
        assert_eq!(TaskPriority::try_from(-1), Ok(TaskPriority::Low));
        assert_eq!(TaskPriority::try_from(0), Ok(TaskPriority::Normal));
        assert_eq!(TaskPriority::try_from(1), Ok(TaskPriority::High));
        assert_eq!(
            TaskPriority::try_from(5),
            Err(TaskValueError::UnknownPriority(5))
        );
    }

    #[test]
    fn test_status_only_patch_leaves_other_columns_alone() {
        let update: UpdateTask = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert_eq!(update.status, Some(TaskStatus::Completed));

        let query = update.set_clause();
        assert!(query.starts_with(
            "UPDATE tasks SET updated_at = $3, status = $4 WHERE id = $1 AND user_id = $2"
        ));
        assert!(!query.contains("title ="));
        assert!(!query.contains("priority ="));
        assert!(!query.contains("description ="));
    }

    #[test]
    fn test_full_patch_binds_in_order() {
        let update = UpdateTask {
            title: Some("t".to_string()),
            description: Some(None),
            status: Some(TaskStatus::Archived),
            priority: Some(TaskPriority::High),
            due_date: Some(None),
        };

        let query = update.set_clause();
        assert!(query.contains(
            "title = $4, description = $5, status = $6, priority = $7, due_date = $8"
        ));
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());

        let update: UpdateTask = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        assert!(!update.is_empty());
        assert_eq!(update.due_date, Some(None));
    }

    #[test]
    fn test_create_task_validation() {
        let ok = CreateTask {
            title: "Write report".to_string(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let empty_title = CreateTask::default();
        assert!(empty_title.validate().is_err());
    }

    #[test]
    fn test_create_task_ignores_status_field() {
        let create: CreateTask =
            serde_json::from_str(r#"{"title": "x", "status": "completed"}"#).unwrap();
        assert_eq!(create.title, "x");
    }
}
