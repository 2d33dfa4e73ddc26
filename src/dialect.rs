//! SQL dialect behavior for the supported backends.
//!
//! Everything that differs between PostgreSQL, MySQL and SQLite at the SQL
//! level lives here: identifier quoting, placeholder style, SELECT ... FOR
//! UPDATE support, and table truncation syntax. The dialect is derived from
//! the system recorded on the registered handle, so lookups are a plain match.

use crate::models::DatabaseSystem;
use sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, QueryBuilder};

/// Placeholder style used in parameterized statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` placeholders (MySQL).
    Question,
    /// `$1`, `$2`, ... placeholders (PostgreSQL; also accepted by SQLite).
    Dollar,
}

impl PlaceholderStyle {
    /// Render the placeholder for the 1-based parameter position.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${}", position),
        }
    }

    /// Whether placeholders carry the parameter position.
    pub fn is_numbered(&self) -> bool {
        matches!(self, Self::Dollar)
    }
}

/// Dialect-specific SQL behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl From<DatabaseSystem> for Dialect {
    fn from(system: DatabaseSystem) -> Self {
        match system {
            DatabaseSystem::PostgreSQL => Self::Postgres,
            DatabaseSystem::MySQL => Self::MySql,
            DatabaseSystem::SQLite => Self::Sqlite,
        }
    }
}

impl Dialect {
    /// Quote an identifier (table or column name) for this dialect.
    ///
    /// MySQL uses backticks, everything else double quotes. Quote characters
    /// embedded in the identifier are doubled.
    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::Postgres | Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Placeholder style for parameterized statements.
    ///
    /// MySQL only understands `?`; every other backend gets numbered dollar
    /// placeholders.
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            Self::MySql => PlaceholderStyle::Question,
            _ => PlaceholderStyle::Dollar,
        }
    }

    /// Whether this dialect supports SELECT ... FOR UPDATE.
    pub fn supports_select_for_update(&self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Build the statement that empties a table.
    ///
    /// SQLite has no TRUNCATE, so it gets a bare DELETE. PostgreSQL cascades
    /// to referencing tables so fixtures can clear tables in any order.
    pub fn truncate_table(&self, table: &str) -> String {
        let quoted = self.quote_identifier(table);
        match self {
            Self::Postgres => format!("TRUNCATE TABLE {} CASCADE", quoted),
            Self::MySql => format!("TRUNCATE TABLE {}", quoted),
            Self::Sqlite => format!("DELETE FROM {}", quoted),
        }
    }

    /// The sea-query backend matching this dialect's placeholder style.
    ///
    /// MySQL maps to the MySQL builder; everything else maps to the PostgreSQL
    /// builder, which emits dollar placeholders and double-quoted identifiers
    /// that SQLite accepts as well. Build statements with `build_any`.
    pub fn statement_builder(&self) -> &'static dyn QueryBuilder {
        match self {
            Self::MySql => &MysqlQueryBuilder,
            _ => &PostgresQueryBuilder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Alias, Expr, Query};

    #[test]
    fn test_placeholder_style_per_dialect() {
        assert_eq!(
            Dialect::MySql.placeholder_style(),
            PlaceholderStyle::Question
        );
        assert_eq!(
            Dialect::Postgres.placeholder_style(),
            PlaceholderStyle::Dollar
        );
        assert_eq!(
            Dialect::Sqlite.placeholder_style(),
            PlaceholderStyle::Dollar
        );
    }

    #[test]
    fn test_placeholder_rendering() {
        assert_eq!(PlaceholderStyle::Question.placeholder(3), "?");
        assert_eq!(PlaceholderStyle::Dollar.placeholder(3), "$3");
        assert!(PlaceholderStyle::Dollar.is_numbered());
        assert!(!PlaceholderStyle::Question.is_numbered());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::Postgres.quote_identifier("post"), "\"post\"");
        assert_eq!(Dialect::Sqlite.quote_identifier("post"), "\"post\"");
        assert_eq!(Dialect::MySql.quote_identifier("post"), "`post`");
    }

    #[test]
    fn test_quote_identifier_doubles_embedded_quotes() {
        assert_eq!(
            Dialect::Postgres.quote_identifier("we\"ird"),
            "\"we\"\"ird\""
        );
        assert_eq!(Dialect::MySql.quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_select_for_update_support() {
        assert!(Dialect::Postgres.supports_select_for_update());
        assert!(!Dialect::MySql.supports_select_for_update());
        assert!(!Dialect::Sqlite.supports_select_for_update());
    }

    #[test]
    fn test_truncate_table() {
        assert_eq!(
            Dialect::Postgres.truncate_table("post"),
            "TRUNCATE TABLE \"post\" CASCADE"
        );
        assert_eq!(
            Dialect::MySql.truncate_table("post"),
            "TRUNCATE TABLE `post`"
        );
        assert_eq!(Dialect::Sqlite.truncate_table("post"), "DELETE FROM \"post\"");
    }

    #[test]
    fn test_statement_builder_placeholders() {
        let stmt = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("post"))
            .and_where(Expr::col(Alias::new("id")).eq(1))
            .to_owned();

        let (sql, _) = stmt.build_any(Dialect::Postgres.statement_builder());
        assert!(sql.contains("$1"), "postgres builder should use $1: {sql}");

        let (sql, _) = stmt.build_any(Dialect::MySql.statement_builder());
        assert!(sql.contains('?'), "mysql builder should use ?: {sql}");

        // SQLite follows the dollar style.
        let (sql, _) = stmt.build_any(Dialect::Sqlite.statement_builder());
        assert!(sql.contains("$1"), "sqlite builder should use $1: {sql}");
    }

    #[test]
    fn test_dialect_from_system() {
        assert_eq!(
            Dialect::from(DatabaseSystem::PostgreSQL),
            Dialect::Postgres
        );
        assert_eq!(Dialect::from(DatabaseSystem::MySQL), Dialect::MySql);
        assert_eq!(Dialect::from(DatabaseSystem::SQLite), Dialect::Sqlite);
    }
}
