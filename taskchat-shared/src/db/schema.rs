/// Schema bootstrap
///
/// TaskChat does not migrate: on startup it makes sure the four tables and
/// their indexes exist, creating whatever is missing. Every statement uses
/// `IF NOT EXISTS`, so calling [`ensure_schema`] against an initialized
/// database is a no-op.
///
/// # Schema
///
/// ```text
/// users ──┬──< tasks            (tasks.user_id    ON DELETE CASCADE)
///         └──< threads ──< messages
///                     (threads.user_id ON DELETE CASCADE,
///                      messages.thread_id ON DELETE CASCADE)
/// ```
///
/// Identifiers are UUIDs generated by the application; timestamps are
/// written by the application as well, so the tables carry no defaults for them.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Advisory lock key serializing concurrent schema bootstraps
///
/// Two processes starting at once would otherwise race on
/// `CREATE TABLE IF NOT EXISTS` and one of them would hit a duplicate
/// `pg_type` entry.
const SCHEMA_LOCK_KEY: i64 = 0x7461_736b_6368_6174; // "taskchat"

/// DDL statements, in dependency order
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email VARCHAR(255) NOT NULL,
        name VARCHAR(255),
        password_hash VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title VARCHAR(255) NOT NULL,
        description TEXT,
        status VARCHAR(20) NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'completed', 'archived')),
        priority SMALLINT NOT NULL DEFAULT 0
            CHECK (priority BETWEEN -1 AND 1),
        due_date TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks (user_id, status)",
    r#"
    CREATE TABLE IF NOT EXISTS threads (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title VARCHAR(255),
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_threads_user_updated ON threads (user_id, updated_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id UUID PRIMARY KEY,
        thread_id UUID NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
        role VARCHAR(20) NOT NULL
            CHECK (role IN ('system', 'user', 'assistant')),
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_thread_created ON messages (thread_id, created_at)",
];

/// Creates any missing tables and indexes
///
/// Runs all statements in a single transaction holding a transaction-scoped
/// advisory lock, so concurrent callers apply the schema one at a time.
///
/// # Errors
///
/// Returns an error if the connection fails or a statement is rejected
/// (e.g., an existing table with an incompatible definition is not detected
/// here; only missing objects are created).
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Ensuring database schema exists");

    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;

    info!(
        statements = SCHEMA_STATEMENTS.len(),
        "Database schema is in place"
    );
    Ok(())
}

/// Lists which of the expected tables exist in the `public` schema
pub async fn existing_tables(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let tables: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT table_name::TEXT
        FROM information_schema.tables
        WHERE table_schema = 'public'
          AND table_name IN ('users', 'tasks', 'threads', 'messages')
        ORDER BY table_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    debug!(tables = ?tables, "Existing tables");
    Ok(tables)
}

/// Creates the database if it doesn't exist
///
/// Useful for development and tests. In production the database should
/// already exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    info!("Checking if database exists");

    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

/// Drops the database
///
/// Permanently deletes all data. Development and tests only.
pub async fn drop_database(database_url: &str) -> Result<(), sqlx::Error> {
    warn!("Dropping database");

    if Postgres::database_exists(database_url).await? {
        Postgres::drop_database(database_url).await?;
        info!("Database dropped successfully");
    } else {
        debug!("Database does not exist, nothing to drop");
    }

    Ok(())
}
