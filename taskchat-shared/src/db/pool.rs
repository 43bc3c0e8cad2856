/// Process-wide PostgreSQL pool
///
/// The API opens one pool at startup, bootstraps the schema through it and
/// hands clones to every handler. A query holds a connection only while it
/// runs. Serverless hosts (Neon) cut idle sockets, so connections are
/// recycled after `max_lifetime` and pinged before reuse.
///
/// ```no_run
/// use taskchat_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = create_pool(DatabaseConfig {
///     max_connections: 20,
///     ..DatabaseConfig::with_url("postgresql://taskchat@localhost/taskchat")
/// })
/// .await?;
///
/// close_pool(pool).await;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Pool sizing and connection lifetimes
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,

    pub max_connections: u32,

    /// Idle connections kept open between bursts
    pub min_connections: u32,

    /// How long a caller waits for a free connection
    pub acquire_timeout: Duration,

    /// `None` keeps idle connections forever
    pub idle_timeout: Option<Duration>,

    /// `None` never recycles a healthy connection
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl DatabaseConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .test_before_acquire(true)
    }
}

/// Connects the pool and checks the database answers
///
/// Fails when the URL is malformed, the server is unreachable within
/// `acquire_timeout`, or the first query errors.
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "Connecting to database"
    );

    let pool = config.pool_options().connect(&config.url).await?;
    health_check(&pool).await?;

    let stats = get_pool_stats(&pool);
    info!(connections = stats.size, "Database pool ready");
    Ok(pool)
}

/// Round-trips `SELECT 1`
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    debug!("Database health check passed");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Open connections, busy or idle
    pub size: u32,
    pub idle: u32,
    pub in_use: u32,
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    let size = pool.size();
    let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX).min(size);

    PoolStats {
        size,
        idle,
        in_use: size - idle,
    }
}

/// Waits for borrowed connections to come back, then closes them all
pub async fn close_pool(pool: PgPool) {
    let stats = get_pool_stats(&pool);
    info!(in_use = stats.in_use, "Closing database pool");
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_recycle_connections() {
        let config = DatabaseConfig::with_url("postgresql://localhost/taskchat");
        assert_eq!(config.url, "postgresql://localhost/taskchat");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.max_lifetime, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_min_connections_capped_by_max() {
        let config = DatabaseConfig {
            max_connections: 2,
            min_connections: 5,
            ..Default::default()
        };
        let options = config.pool_options();
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_max_connections(), 2);
    }
}
