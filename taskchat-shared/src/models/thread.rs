/// Thread model and database operations
///
/// A thread is one conversation session owned by a user. Its messages are
/// removed with it (`ON DELETE CASCADE`), and `updated_at` moves forward every
/// time a message is appended, so listing by `updated_at` gives "most recently
/// active first".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;

use super::{double_option, push_assignment};

const THREAD_COLUMNS: &str = "id, user_id, title, created_at, updated_at";

/// Thread row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Thread {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Optional title (chat derives one from the first message)
    pub title: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Last change to the thread or its messages
    pub updated_at: DateTime<Utc>,
}

/// Thread as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Thread> for ThreadRead {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            user_id: thread.user_id,
            title: thread.title,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateThread {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateThread {
    /// New title (`null` clears it)
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<Option<String>>,
}

impl UpdateThread {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
    }

    /// Owner-scoped UPDATE: `$1` id, `$2` owner, `$3` updated_at
    pub fn set_clause(&self) -> String {
        let mut query = String::from("UPDATE threads SET updated_at = $3");
        let mut bind_count = 3;

        if self.title.is_some() {
            push_assignment(&mut query, &mut bind_count, "title");
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {}",
            THREAD_COLUMNS
        ));
        query
    }
}

impl Thread {
    /// Creates a new thread for `user_id`
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: CreateThread,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        let thread = sqlx::query_as::<_, Thread>(&format!(
            r#"
            INSERT INTO threads (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {}
            "#,
            THREAD_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.title)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(thread)
    }

    /// Finds a thread by ID regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let thread = sqlx::query_as::<_, Thread>(&format!(
            "SELECT {} FROM threads WHERE id = $1",
            THREAD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(thread)
    }

    /// Lists a user's threads, most recently active first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let threads = sqlx::query_as::<_, Thread>(&format!(
            r#"
            SELECT {}
            FROM threads
            WHERE user_id = $1
            ORDER BY updated_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
            THREAD_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(threads)
    }

    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM threads WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Applies a partial update to a thread owned by `user_id`
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateThread,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = data.set_clause();

        let mut q = sqlx::query_as::<_, Thread>(&query)
            .bind(id)
            .bind(user_id)
            .bind(Utc::now());

        if let Some(title) = data.title {
            q = q.bind(title);
        }

        let thread = q.fetch_optional(pool).await?;

        Ok(thread)
    }

    /// Bumps `updated_at` to `at`
    ///
    /// Takes any executor so message inserts can touch the thread inside
    /// their own transaction.
    pub async fn touch<'e, E>(executor: E, id: Uuid, at: DateTime<Utc>) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE threads SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a thread owned by `user_id` together with its messages
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM threads WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
