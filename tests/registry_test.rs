//! Integration tests for the database registry.
//!
//! Tests verify that:
//! - Registration connects a pool and records the configuration
//! - Duplicate names are rejected
//! - Unregistration closes the pool and frees the name
//! - Handles stay usable after unregistration

use dbhub::{DatabaseConfiguration, DbError, DbProvider, Registry};
use tempfile::NamedTempFile;

/// Create a SQLite DSN backed by a kept temp file.
fn sqlite_dsn() -> (String, String) {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    (format!("sqlite:{}", db_path), db_path)
}

#[tokio::test]
async fn test_register_and_lookup() {
    let registry = Registry::new();
    let (dsn, db_path) = sqlite_dsn();

    let info = registry
        .register(DatabaseConfiguration::new("blog", &dsn).unwrap())
        .await
        .unwrap();

    assert_eq!(info.name, "blog");
    assert_eq!(info.system, dbhub::DatabaseSystem::SQLite);
    assert!(info.server_version.is_some());
    assert!(!info.read_only);

    assert!(registry.contains("blog").await);
    assert_eq!(registry.len().await, 1);
    assert_eq!(registry.list().await, vec!["blog".to_string()]);

    let handle = registry.get("blog").await.unwrap();
    assert_eq!(handle.name(), "blog");
    assert_eq!(handle.system(), dbhub::DatabaseSystem::SQLite);

    registry.unregister("blog").await.unwrap();
    std::fs::remove_file(db_path).unwrap();
}

#[tokio::test]
async fn test_register_duplicate_name_rejected() {
    let registry = Registry::new();
    let (dsn, db_path) = sqlite_dsn();

    registry
        .register(DatabaseConfiguration::new("dup", &dsn).unwrap())
        .await
        .unwrap();

    let result = registry
        .register(DatabaseConfiguration::new("dup", &dsn).unwrap())
        .await;
    assert!(matches!(result, Err(DbError::AlreadyRegistered { .. })));

    // The original registration is untouched
    assert!(registry.contains("dup").await);

    registry.unregister("dup").await.unwrap();
    std::fs::remove_file(db_path).unwrap();
}

#[tokio::test]
async fn test_unregister_frees_the_name() {
    let registry = Registry::new();
    let (dsn, db_path) = sqlite_dsn();

    registry
        .register(DatabaseConfiguration::new("reuse", &dsn).unwrap())
        .await
        .unwrap();
    registry.unregister("reuse").await.unwrap();

    assert!(!registry.contains("reuse").await);
    assert!(matches!(
        registry.get("reuse").await,
        Err(DbError::NotRegistered { .. })
    ));

    // The name can be registered again
    registry
        .register(DatabaseConfiguration::new("reuse", &dsn).unwrap())
        .await
        .unwrap();
    registry.unregister("reuse").await.unwrap();
    std::fs::remove_file(db_path).unwrap();
}

#[tokio::test]
async fn test_unregister_closes_the_pool() {
    let registry = Registry::new();
    let (dsn, db_path) = sqlite_dsn();

    registry
        .register(DatabaseConfiguration::new("closing", &dsn).unwrap())
        .await
        .unwrap();

    let provider = DbProvider::new(&registry, "closing").await.unwrap();
    let executor = provider.executor();
    executor
        .execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])
        .await
        .unwrap();

    registry.unregister("closing").await.unwrap();

    // The handle's metadata stays readable, but statements fail on the
    // closed pool.
    assert_eq!(provider.name(), "closing");
    assert!(executor.query("SELECT id FROM t", &[]).await.is_err());

    std::fs::remove_file(db_path).unwrap();
}

#[tokio::test]
async fn test_close_all_empties_the_registry() {
    let registry = Registry::new();
    let (dsn_a, path_a) = sqlite_dsn();
    let (dsn_b, path_b) = sqlite_dsn();

    registry
        .register(DatabaseConfiguration::new("a", &dsn_a).unwrap())
        .await
        .unwrap();
    registry
        .register(DatabaseConfiguration::new("b", &dsn_b).unwrap())
        .await
        .unwrap();
    assert_eq!(registry.len().await, 2);

    registry.close_all().await;
    assert!(registry.is_empty().await);

    std::fs::remove_file(path_a).unwrap();
    std::fs::remove_file(path_b).unwrap();
}

#[tokio::test]
async fn test_list_detail_reports_registrations() {
    let registry = Registry::new();
    let (dsn, db_path) = sqlite_dsn();

    registry
        .register(
            DatabaseConfiguration::new("detailed", &dsn)
                .unwrap()
                .read_only(false),
        )
        .await
        .unwrap();

    let details = registry.list_detail().await;
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].name, "detailed");
    assert_eq!(details[0].system, dbhub::DatabaseSystem::SQLite);

    registry.unregister("detailed").await.unwrap();
    std::fs::remove_file(db_path).unwrap();
}
