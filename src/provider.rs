//! Database providers.
//!
//! A [`DbProvider`] is the user-facing view of one registered database: it
//! resolves the handle once and exposes the executor plus the dialect-specific
//! behavior callers need to build statements.

use crate::db::{DbHandle, Registry, SqlExecutor};
use crate::dialect::{Dialect, PlaceholderStyle};
use crate::error::DbResult;
use crate::models::DatabaseSystem;
use sea_query::QueryBuilder;

/// Provider bound to one registered database.
#[derive(Debug, Clone)]
pub struct DbProvider {
    handle: DbHandle,
}

impl DbProvider {
    /// Create a provider for the database registered under `name`.
    pub async fn new(registry: &Registry, name: &str) -> DbResult<Self> {
        let handle = registry.get(name).await?;
        Ok(Self { handle })
    }

    /// Create a provider directly from a handle.
    pub fn from_handle(handle: DbHandle) -> Self {
        Self { handle }
    }

    /// An executor for running statements against this database.
    pub fn executor(&self) -> SqlExecutor {
        SqlExecutor::new(self.handle.clone())
    }

    /// Quote an identifier according to the dialect.
    pub fn escape_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    /// Whether this database can perform SELECT ... FOR UPDATE statements.
    pub fn can_select_for_update(&self) -> bool {
        self.dialect().supports_select_for_update()
    }

    /// The placeholder style for parameterized statements.
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.dialect().placeholder_style()
    }

    /// The sea-query backend matching this database's dialect.
    pub fn statement_builder(&self) -> &'static dyn QueryBuilder {
        self.dialect().statement_builder()
    }

    /// The SQL dialect of this database.
    pub fn dialect(&self) -> Dialect {
        self.handle.dialect()
    }

    /// The database system behind this provider.
    pub fn system(&self) -> DatabaseSystem {
        self.handle.system()
    }

    /// The name this database is registered under.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// The underlying handle.
    pub fn handle(&self) -> &DbHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfiguration;

    async fn sqlite_registry() -> Registry {
        let registry = Registry::new();
        let config = DatabaseConfiguration::new("mem", "sqlite::memory:").unwrap();
        registry.register(config).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_provider_for_unknown_name() {
        let registry = Registry::new();
        let result = DbProvider::new(&registry, "missing").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_provider_dialect_behavior() {
        let registry = sqlite_registry().await;
        let provider = DbProvider::new(&registry, "mem").await.unwrap();

        assert_eq!(provider.name(), "mem");
        assert_eq!(provider.system(), DatabaseSystem::SQLite);
        assert_eq!(provider.escape_identifier("post"), "\"post\"");
        assert_eq!(provider.placeholder_style(), PlaceholderStyle::Dollar);
        assert!(!provider.can_select_for_update());
    }

    #[tokio::test]
    async fn test_provider_executor_runs_statements() {
        let registry = sqlite_registry().await;
        let provider = DbProvider::new(&registry, "mem").await.unwrap();
        let executor = provider.executor();

        executor
            .execute("CREATE TABLE post (id INTEGER PRIMARY KEY, title TEXT)", &[])
            .await
            .unwrap();
        let affected = executor
            .execute(
                "INSERT INTO post (id, title) VALUES ($1, $2)",
                &[
                    crate::models::QueryParam::Int(1),
                    crate::models::QueryParam::String("hello".to_string()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let result = executor.query("SELECT id, title FROM post", &[]).await.unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.rows[0]["title"], "hello");
    }
}
