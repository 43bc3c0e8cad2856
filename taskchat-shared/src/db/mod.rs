/// Database layer for TaskChat
///
/// This module owns the process-wide connection pool and the schema bootstrap.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `schema`: Create-if-missing table definitions for users, tasks, threads, messages
/// - Models are in the `models` module at crate root level
///
/// # Example
///
/// ```no_run
/// use taskchat_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskchat_shared::db::schema::ensure_schema;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     ensure_schema(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod pool;
pub mod schema;
