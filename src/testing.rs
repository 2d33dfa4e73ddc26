//! Test fixtures for the three supported backends.
//!
//! [`TestDatabase::setup`] registers a throwaway database and returns a guard
//! whose [`teardown`](TestDatabase::teardown) empties the given tables and
//! removes the registration. The backend is chosen by the `DBHUB_TEST_DB`
//! environment variable:
//!
//! - `postgres` - DSN read from `DBHUB_TEST_DSN`
//! - `mysql` - DSN read from `DBHUB_TEST_DSN`
//! - anything else - a fresh temporary SQLite file
//!
//! SQLite fixtures skip truncation on teardown; the database file is deleted
//! instead.

use crate::config::DatabaseConfiguration;
use crate::db::Registry;
use crate::error::{DbError, DbResult};
use crate::hook::TracingHook;
use crate::models::DatabaseSystem;
use crate::provider::DbProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Environment variable selecting the fixture backend.
pub const TEST_DB_ENV: &str = "DBHUB_TEST_DB";

/// Environment variable carrying the DSN for network backends.
pub const TEST_DSN_ENV: &str = "DBHUB_TEST_DSN";

/// A registered throwaway database.
pub struct TestDatabase {
    registry: Registry,
    name: String,
    dsn: String,
    tables: Vec<String>,
    sqlite_path: Option<PathBuf>,
    torn_down: bool,
}

impl TestDatabase {
    /// Register a test database under `name`.
    ///
    /// `tables` lists the tables teardown will empty on the network backends.
    pub async fn setup(registry: &Registry, name: &str, tables: &[&str]) -> DbResult<Self> {
        match std::env::var(TEST_DB_ENV).as_deref() {
            Ok("postgres") | Ok("mysql") => Self::setup_from_dsn(registry, name, tables).await,
            _ => Self::setup_sqlite(registry, name, tables).await,
        }
    }

    async fn setup_from_dsn(registry: &Registry, name: &str, tables: &[&str]) -> DbResult<Self> {
        let dsn = std::env::var(TEST_DSN_ENV).map_err(|_| {
            DbError::configuration(format!(
                "{} must be set when {} selects a network backend",
                TEST_DSN_ENV, TEST_DB_ENV
            ))
        })?;

        let config = DatabaseConfiguration::new(name, &dsn)?.with_hook(Arc::new(TracingHook));
        registry.register(config).await?;

        Ok(Self {
            registry: registry.clone(),
            name: name.to_string(),
            dsn,
            tables: tables.iter().map(|t| t.to_string()).collect(),
            sqlite_path: None,
            torn_down: false,
        })
    }

    async fn setup_sqlite(registry: &Registry, name: &str, tables: &[&str]) -> DbResult<Self> {
        let path = std::env::temp_dir().join(format!("dbhub_{}_{}.sqlite", name, Uuid::new_v4()));
        let dsn = format!("sqlite:{}", path.display());

        let config = DatabaseConfiguration::new(name, &dsn)?.with_hook(Arc::new(TracingHook));
        registry.register(config).await?;

        Ok(Self {
            registry: registry.clone(),
            name: name.to_string(),
            dsn,
            tables: tables.iter().map(|t| t.to_string()).collect(),
            sqlite_path: Some(path),
            torn_down: false,
        })
    }

    /// The name this fixture is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The DSN the fixture connected with.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// A provider over the fixture database.
    pub async fn provider(&self) -> DbResult<DbProvider> {
        DbProvider::new(&self.registry, &self.name).await
    }

    /// Empty the test tables, unregister the database, and remove any
    /// temporary file.
    pub async fn teardown(mut self) -> DbResult<()> {
        let provider = self.provider().await?;

        // SQLite fixtures are deleted wholesale; only the network backends
        // need their shared tables emptied.
        if provider.system() != DatabaseSystem::SQLite {
            let executor = provider.executor();
            let dialect = provider.dialect();
            for table in &self.tables {
                executor.execute(&dialect.truncate_table(table), &[]).await?;
            }
        }

        self.registry.unregister(&self.name).await?;

        if let Some(path) = self.sqlite_path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove SQLite fixture file");
            }
        }

        self.torn_down = true;
        Ok(())
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        // Best effort: the registration leaks until the registry is dropped,
        // but the fixture file should not outlive the test.
        if let Some(path) = self.sqlite_path.take() {
            let _ = std::fs::remove_file(&path);
        }
        warn!(
            name = %self.name,
            "TestDatabase dropped without teardown() - registration leaked"
        );
    }
}
