/// User model and database operations
///
/// Users own tasks and threads. Deleting a user removes both (and the
/// threads' messages) through `ON DELETE CASCADE` foreign keys.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255),
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```
///
/// Emails are normalized (trimmed, lowercased) before they are stored or
/// looked up, so uniqueness is effectively case-insensitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{double_option, push_assignment};

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at, updated_at";

/// User row
///
/// Passwords are stored as Argon2id hashes, never in plaintext. Use
/// [`UserRead`] for anything that leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Normalized email address, unique across all users
    pub email: String,

    /// Optional display name
    pub name: Option<String>,

    /// Argon2id password hash
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// User as returned by the API (no password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRead {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserRead {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Registration input
///
/// Carries the plaintext password; it is hashed before anything is stored
/// (see [`CreateUser::into_new_user`]).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    /// Email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    /// Optional display name
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    /// Plaintext password
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

impl CreateUser {
    /// Swaps the plaintext password for its hash and normalizes the email
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            email: normalize_email(&self.email),
            name: self.name,
            password_hash,
        }
    }
}

/// Insert payload for [`User::create`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

/// Partial update for a user
///
/// All fields are optional. Only present fields are written.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    /// New email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    /// New display name (`null` clears it)
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<Option<String>>,
}

impl UpdateUser {
    /// True when the patch carries no fields
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none()
    }

    /// Builds the UPDATE statement for the fields present in this patch
    ///
    /// `$1` is the user id and `$2` the new `updated_at`; field values follow
    /// in declaration order.
    pub fn set_clause(&self) -> String {
        let mut query = String::from("UPDATE users SET updated_at = $2");
        let mut bind_count = 2;

        if self.email.is_some() {
            push_assignment(&mut query, &mut bind_count, "email");
        }
        if self.name.is_some() {
            push_assignment(&mut query, &mut bind_count, "name");
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));
        query
    }
}

/// Trims and lowercases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user
    ///
    /// Assigns a fresh id and sets both timestamps to now.
    ///
    /// # Errors
    ///
    /// Returns a database error if the email already exists (unique
    /// constraint `users_email_key`); nothing is written in that case.
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(normalize_email(&data.email))
        .bind(data.name)
        .bind(data.password_hash)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (normalized before lookup)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Applies a partial update
    ///
    /// Only fields present in `data` are written; `updated_at` is always
    /// refreshed.
    ///
    /// # Returns
    ///
    /// The updated user, or None if the user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns a database error if the new email belongs to another user
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = data.set_clause();

        let mut q = sqlx::query_as::<_, User>(&query).bind(id).bind(Utc::now());

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user and, by cascade, their tasks, threads and messages
    ///
    /// # Returns
    ///
    /// True if the user was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
