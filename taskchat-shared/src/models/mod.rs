/// Database models for TaskChat
///
/// Each entity has one canonical record type (the table row, `sqlx::FromRow`)
/// and explicit projections around it:
///
/// - a **read** shape, safe to return from the API
/// - a **create** shape, the validated input for a new row
/// - an **update** shape, where every field is optional and only fields that
///   are present get written
///
/// # Models
///
/// - `user`: User accounts (own tasks and threads)
/// - `task`: Todo items with status and priority
/// - `thread`: Conversation sessions
/// - `message`: Ordered messages inside a thread
///
/// # Example
///
/// ```no_run
/// use taskchat_shared::models::user::{User, NewUser};
/// use taskchat_shared::models::task::{Task, CreateTask, UpdateTask, TaskStatus};
/// use taskchat_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, NewUser {
///     email: "user@example.com".to_string(),
///     name: Some("Jane Doe".to_string()),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let task = Task::create(&pool, user.id, CreateTask {
///     title: "Buy milk".to_string(),
///     ..Default::default()
/// }).await?;
///
/// let update = UpdateTask { status: Some(TaskStatus::Completed), ..Default::default() };
/// Task::update(&pool, task.id, user.id, update).await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Deserializer};

pub mod message;
pub mod task;
pub mod thread;
pub mod user;

/// Deserializes a present field (including an explicit `null`) as `Some(..)`
///
/// Used with `#[serde(default)]` on `Option<Option<T>>` fields so a patch can
/// tell "absent" (outer `None`, leave untouched) from `null` (`Some(None)`,
/// clear the column).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Appends `, column = $n` to an UPDATE statement and advances the bind counter
pub(crate) fn push_assignment(query: &mut String, bind_count: &mut usize, column: &str) {
    *bind_count += 1;
    query.push_str(&format!(", {} = ${}", column, bind_count));
}
