/// Message model and database operations
///
/// Messages belong to a thread and are kept in chronological order
/// (`created_at`, then `id` as a tiebreaker). Appending a message bumps the
/// parent thread's `updated_at` in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::thread::Thread;

const MESSAGE_COLUMNS: &str = "id, thread_id, role, content, created_at, updated_at";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown message role: {0}")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for MessageRole {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// Message row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: Uuid,
    #[sqlx(try_from = "String")]
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRead {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for MessageRead {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            thread_id: message.thread_id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMessage {
    pub role: MessageRole,

    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMessage {
    #[serde(default)]
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,
}

impl UpdateMessage {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

impl Message {
    /// Appends a message to a thread and bumps the thread's `updated_at`
    pub async fn create(
        pool: &PgPool,
        thread_id: Uuid,
        data: CreateMessage,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (id, thread_id, role, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(thread_id)
        .bind(data.role.as_str())
        .bind(data.content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        Thread::touch(&mut *tx, thread_id, now).await?;

        tx.commit().await?;

        Ok(message)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }

    /// Finds a message only if it belongs to `thread_id`
    pub async fn find_for_thread(
        pool: &PgPool,
        id: Uuid,
        thread_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE id = $1 AND thread_id = $2",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(thread_id)
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }

    /// Lists a page of a thread's messages, oldest first
    pub async fn list_for_thread(
        pool: &PgPool,
        thread_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {}
            FROM messages
            WHERE thread_id = $1
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(thread_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    /// Returns the last `n` messages of a thread in chronological order
    pub async fn recent_for_thread(
        pool: &PgPool,
        thread_id: Uuid,
        n: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {}
            FROM messages
            WHERE thread_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(thread_id)
        .bind(n)
        .fetch_all(pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    pub async fn count_for_thread(pool: &PgPool, thread_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE thread_id = $1")
                .bind(thread_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Replaces a message's content; an empty patch returns the message as is
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        thread_id: Uuid,
        data: UpdateMessage,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(content) = data.content else {
            return Self::find_for_thread(pool, id, thread_id).await;
        };

        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            UPDATE messages
            SET content = $3, updated_at = $4
            WHERE id = $1 AND thread_id = $2
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(thread_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }

    pub async fn delete(pool: &PgPool, id: Uuid, thread_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND thread_id = $2")
            .bind(id)
            .bind(thread_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_text() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            assert_eq!(MessageRole::try_from(role.as_str().to_string()).unwrap(), role);
        }
        assert!(MessageRole::try_from("tool".to_string()).is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(MessageRole::Assistant).unwrap(),
            serde_json::json!("assistant")
        );
        let role: MessageRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, MessageRole::User);
    }

    #[test]
    fn test_update_message_is_partial() {
        let empty: UpdateMessage = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
        assert!(empty.validate().is_ok());

        let blank: UpdateMessage = serde_json::from_str(r#"{"content": ""}"#).unwrap();
        assert!(!blank.is_empty());
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_create_message_rejects_empty_content() {
        let create = CreateMessage {
            role: MessageRole::User,
            content: String::new(),
        };
        assert!(create.validate().is_err());
    }
}
