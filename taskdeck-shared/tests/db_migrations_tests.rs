/// Integration tests for schema migrations
///
/// Skipped unless DATABASE_URL points at a reachable PostgreSQL.

use taskdeck_shared::db::migrations::{ensure_database_exists, get_migration_status, run_migrations};
use taskdeck_shared::db::pool::{close_pool, create_pool, DatabaseConfig};

async fn migrated_pool() -> Option<sqlx::PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;

    ensure_database_exists(&url).await.expect("Failed to ensure database");
    let pool = create_pool(DatabaseConfig::from_url(url))
        .await
        .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Migrations failed");

    Some(pool)
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let before = get_migration_status(&pool).await.unwrap();
    run_migrations(&pool).await.expect("Second run failed");
    let after = get_migration_status(&pool).await.unwrap();

    assert!(before.is_up_to_date);
    assert_eq!(before.applied_migrations, after.applied_migrations);
    assert_eq!(before.latest_version, after.latest_version);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_schema_tables_exist() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    for table in [
        "users",
        "projects",
        "boards",
        "tasks",
        "labels",
        "task_labels",
        "comments",
        "attachments",
        "task_history",
    ] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT FROM information_schema.tables WHERE table_schema = 'public' AND table_name = $1)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();

        assert!(exists, "table {} missing", table);
    }

    close_pool(pool).await;
}

#[tokio::test]
async fn test_task_priority_enum() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let values: Vec<String> = sqlx::query_scalar(
        "SELECT unnest(enum_range(NULL::task_priority))::text",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(values, vec!["low", "medium", "high"]);

    close_pool(pool).await;
}
