//! Connection-related data models.

use serde::{Deserialize, Serialize};

/// Supported database systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseSystem {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseSystem {
    /// Parse the database system from a connection string.
    pub fn from_dsn(dsn: &str) -> Option<Self> {
        let lower = dsn.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database system.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    /// Get the default port for this database system.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::PostgreSQL => Some(5432),
            Self::MySQL => Some(3306),
            Self::SQLite => None,
        }
    }
}

impl std::fmt::Display for DatabaseSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Information about a registered database, returned after successful registration.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub system: DatabaseSystem,
    pub server_version: Option<String>,
    pub read_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_from_dsn() {
        assert_eq!(
            DatabaseSystem::from_dsn("postgres://localhost/db"),
            Some(DatabaseSystem::PostgreSQL)
        );
        assert_eq!(
            DatabaseSystem::from_dsn("postgresql://localhost/db"),
            Some(DatabaseSystem::PostgreSQL)
        );
        assert_eq!(
            DatabaseSystem::from_dsn("mysql://localhost/db"),
            Some(DatabaseSystem::MySQL)
        );
        assert_eq!(
            DatabaseSystem::from_dsn("mariadb://localhost/db"),
            Some(DatabaseSystem::MySQL)
        );
        assert_eq!(
            DatabaseSystem::from_dsn("sqlite:test.db"),
            Some(DatabaseSystem::SQLite)
        );
        assert_eq!(
            DatabaseSystem::from_dsn("sqlite:///tmp/test.db"),
            Some(DatabaseSystem::SQLite)
        );
        assert_eq!(DatabaseSystem::from_dsn("unknown://localhost"), None);
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(DatabaseSystem::PostgreSQL.default_port(), Some(5432));
        assert_eq!(DatabaseSystem::MySQL.default_port(), Some(3306));
        assert_eq!(DatabaseSystem::SQLite.default_port(), None);
    }
}
