/// Integration tests for schema bootstrap
///
/// Require PostgreSQL at DATABASE_URL; skipped otherwise.

mod common;

use sqlx::migrate::MigrateDatabase;
use sqlx::Postgres;
use taskchat_shared::db::schema::{drop_database, ensure_database_exists, ensure_schema, existing_tables};

#[tokio::test]
async fn test_schema_creates_all_tables() {
    let Some(pool) = common::setup_pool().await else { return };

    let tables = existing_tables(&pool).await.unwrap();
    assert_eq!(tables, vec!["messages", "tasks", "threads", "users"]);
}

#[tokio::test]
async fn test_ensure_schema_is_idempotent() {
    let Some(pool) = common::setup_pool().await else { return };

    ensure_schema(&pool).await.expect("Second run should succeed");
    ensure_schema(&pool).await.expect("Third run should succeed");
}

#[tokio::test]
async fn test_concurrent_bootstraps_do_not_conflict() {
    let Some(pool) = common::setup_pool().await else { return };

    let a = tokio::spawn({
        let pool = pool.clone();
        async move { ensure_schema(&pool).await }
    });
    let b = tokio::spawn({
        let pool = pool.clone();
        async move { ensure_schema(&pool).await }
    });

    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_create_and_drop_scratch_database() {
    let Some(url) = common::database_url() else { return };
    let Some((base, _)) = url.rsplit_once('/') else { return };
    let scratch = format!("{}/taskchat_scratch_{}", base, uuid::Uuid::new_v4().simple());

    ensure_database_exists(&scratch).await.unwrap();
    ensure_database_exists(&scratch).await.unwrap();
    assert!(Postgres::database_exists(&scratch).await.unwrap());

    drop_database(&scratch).await.unwrap();
    assert!(!Postgres::database_exists(&scratch).await.unwrap());
    drop_database(&scratch).await.unwrap();
}
