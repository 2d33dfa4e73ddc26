//! Registry of named database handles.
//!
//! The registry maps connection names to live handles behind a read/write
//! lock. Lookups take the read lock; registration and removal take the write
//! lock. Pools are never created or closed while a lock is held.

use crate::config::DatabaseConfiguration;
use crate::db::pool::DbPool;
use crate::error::{DbError, DbResult};
use crate::hook::ExecutorHook;
use crate::models::{DatabaseInfo, DatabaseSystem};
use crate::dialect::Dialect;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A registered database: pool plus configuration.
///
/// Handles are cheap to clone. Unregistering closes the underlying pool, so
/// executors over outstanding clones start failing at that point.
#[derive(Debug, Clone)]
pub struct DbHandle {
    pool: DbPool,
    config: Arc<DatabaseConfiguration>,
    server_version: Option<String>,
}

impl DbHandle {
    /// The underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// The name this database is registered under.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The database system behind this handle.
    pub fn system(&self) -> DatabaseSystem {
        self.config.system
    }

    /// The SQL dialect for this database.
    pub fn dialect(&self) -> Dialect {
        Dialect::from(self.config.system)
    }

    /// Whether this database rejects write statements.
    pub fn read_only(&self) -> bool {
        self.config.read_only
    }

    /// The executor hook attached to this database, if any.
    pub fn hook(&self) -> Option<&Arc<dyn ExecutorHook>> {
        self.config.hook.as_ref()
    }

    /// The server version reported at registration time.
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Summary of this registration.
    pub fn info(&self) -> DatabaseInfo {
        DatabaseInfo {
            name: self.config.name.clone(),
            system: self.config.system,
            server_version: self.server_version.clone(),
            read_only: self.config.read_only,
        }
    }
}

/// Named registry of database handles.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    databases: Arc<RwLock<HashMap<String, DbHandle>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a pool for the configuration and register it under its name.
    ///
    /// Registering a name that is already taken is an error.
    pub async fn register(&self, config: DatabaseConfiguration) -> DbResult<DatabaseInfo> {
        let name = config.name.clone();

        // Early check for an existing registration
        {
            let databases = self.databases.read().await;
            if databases.contains_key(&name) {
                return Err(DbError::already_registered(&name));
            }
        }

        info!(
            name = %name,
            system = %config.system,
            read_only = config.read_only,
            "Registering database"
        );

        let pool = DbPool::connect(&config).await?;
        let server_version = pool.server_version().await;

        let handle = DbHandle {
            pool,
            config: Arc::new(config),
            server_version,
        };
        let db_info = handle.info();

        // Re-check after async work to prevent TOCTOU race.
        // If a duplicate sneaked in, return the handle so its pool can be
        // closed outside the lock.
        let maybe_loser: Option<DbHandle> = {
            let mut databases = self.databases.write().await;
            if databases.contains_key(&name) {
                Some(handle)
            } else {
                databases.insert(name.clone(), handle);
                None
            }
        }; // Lock released here

        if let Some(loser) = maybe_loser {
            loser.pool.close().await;
            return Err(DbError::already_registered(&name));
        }

        info!(
            name = %name,
            server_version = ?db_info.server_version,
            "Database registered"
        );

        Ok(db_info)
    }

    /// Remove a registration and close its pool.
    pub async fn unregister(&self, name: &str) -> DbResult<()> {
        let handle = {
            let mut databases = self.databases.write().await;
            databases
                .remove(name)
                .ok_or_else(|| DbError::not_registered(name))?
        }; // Lock released here

        info!(name = %name, "Unregistering database");
        handle.pool.close().await;
        Ok(())
    }

    /// Look up a handle by name.
    pub async fn get(&self, name: &str) -> DbResult<DbHandle> {
        let databases = self.databases.read().await;
        databases
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::not_registered(name))
    }

    /// Check if a name is registered.
    pub async fn contains(&self, name: &str) -> bool {
        let databases = self.databases.read().await;
        databases.contains_key(name)
    }

    /// List all registered names.
    pub async fn list(&self) -> Vec<String> {
        let databases = self.databases.read().await;
        databases.keys().cloned().collect()
    }

    /// List all registrations with details.
    pub async fn list_detail(&self) -> Vec<DatabaseInfo> {
        let databases = self.databases.read().await;
        databases.values().map(DbHandle::info).collect()
    }

    /// Get the number of registered databases.
    pub async fn len(&self) -> usize {
        let databases = self.databases.read().await;
        databases.len()
    }

    /// Check whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Close all pools and clear the registry.
    pub async fn close_all(&self) {
        let drained: Vec<(String, DbHandle)> = {
            let mut databases = self.databases.write().await;
            databases.drain().collect()
        }; // Lock released here

        for (name, handle) in drained {
            info!(name = %name, "Closing database");
            handle.pool.close().await;
        }
        info!("All databases closed");
    }
}
