//! Statement execution.
//!
//! [`SqlExecutor`] runs parameterized statements against a registered
//! database with support for:
//! - Row limits (enforced via streaming - only fetches needed rows)
//! - Statement timeouts
//! - Executor hooks invoked around every statement
//!
//! # Architecture
//!
//! Execution dispatches to database-specific submodules:
//! - `mysql`: MySQL-specific query and write operations
//! - `postgres`: PostgreSQL-specific query and write operations
//! - `sqlite`: SQLite-specific query and write operations
//!
//! Each submodule provides identical functionality adapted to the database's
//! type system.

use crate::db::pool::DbPool;
use crate::db::registry::DbHandle;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_ROW_LIMIT, DEFAULT_STATEMENT_TIMEOUT_SECS, MAX_ROW_LIMIT, QueryParam, QueryResult};
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Executor bound to one registered database.
#[derive(Debug, Clone)]
pub struct SqlExecutor {
    handle: DbHandle,
    default_timeout: Duration,
    default_limit: u32,
}

impl SqlExecutor {
    /// Create an executor over the given handle with default settings.
    pub fn new(handle: DbHandle) -> Self {
        Self {
            handle,
            default_timeout: Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS as u64),
            default_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Set the statement timeout.
    pub fn with_timeout(mut self, statement_timeout: Duration) -> Self {
        self.default_timeout = statement_timeout;
        self
    }

    /// Set the row limit for queries.
    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.default_limit = row_limit.clamp(1, MAX_ROW_LIMIT);
        self
    }

    /// The handle this executor runs against.
    pub fn handle(&self) -> &DbHandle {
        &self.handle
    }

    /// Execute a SELECT query and return decoded rows.
    pub async fn query(&self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
        let start = Instant::now();
        let row_limit = self.default_limit;
        let statement_timeout = self.default_timeout;

        debug!(
            database = %self.handle.name(),
            sql = %sql,
            params = params.len(),
            limit = row_limit,
            timeout_secs = statement_timeout.as_secs(),
            "Executing query"
        );

        self.hook_before(sql);
        let result = match self.handle.pool() {
            DbPool::MySql(p) => {
                mysql::fetch_rows(p, sql, params, row_limit, statement_timeout)
                    .await
                    .and_then(|rows| process_rows(rows, row_limit, start))
            }
            DbPool::Postgres(p) => {
                postgres::fetch_rows(p, sql, params, row_limit, statement_timeout)
                    .await
                    .and_then(|rows| process_rows(rows, row_limit, start))
            }
            DbPool::SQLite(p) => {
                sqlite::fetch_rows(p, sql, params, row_limit, statement_timeout)
                    .await
                    .and_then(|rows| process_rows(rows, row_limit, start))
            }
        };
        self.hook_after(sql, result.as_ref().err(), start.elapsed());
        result
    }

    /// Execute a write statement (INSERT, UPDATE, DELETE, DDL) and return
    /// affected rows.
    ///
    /// Rejected up front when the database was registered read-only.
    pub async fn execute(&self, sql: &str, params: &[QueryParam]) -> DbResult<u64> {
        if self.handle.read_only() {
            return Err(DbError::permission(
                "execute",
                format!(
                    "database '{}' is registered read-only",
                    self.handle.name()
                ),
            ));
        }

        let start = Instant::now();
        let statement_timeout = self.default_timeout;

        debug!(
            database = %self.handle.name(),
            sql = %sql,
            params = params.len(),
            timeout_secs = statement_timeout.as_secs(),
            "Executing write statement"
        );

        self.hook_before(sql);
        let result = match self.handle.pool() {
            DbPool::MySql(p) => mysql::execute_write(p, sql, params, statement_timeout).await,
            DbPool::Postgres(p) => postgres::execute_write(p, sql, params, statement_timeout).await,
            DbPool::SQLite(p) => sqlite::execute_write(p, sql, params, statement_timeout).await,
        };
        self.hook_after(sql, result.as_ref().err(), start.elapsed());
        result
    }

    fn hook_before(&self, sql: &str) {
        if let Some(hook) = self.handle.hook() {
            hook.before_statement(self.handle.name(), sql);
        }
    }

    fn hook_after(&self, sql: &str, error: Option<&DbError>, elapsed: Duration) {
        if let Some(hook) = self.handle.hook() {
            hook.after_statement(self.handle.name(), sql, error, elapsed);
        }
    }
}

/// Process rows from any database type into a QueryResult.
fn process_rows<R: RowToJson>(
    rows: Vec<R>,
    row_limit: u32,
    start: Instant,
) -> DbResult<QueryResult> {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if rows.is_empty() {
        return Ok(QueryResult::empty(execution_time_ms));
    }

    let columns = rows[0].column_metadata();
    let total_rows = rows.len();
    let truncated = total_rows > row_limit as usize;
    let rows_to_take = (row_limit as usize).min(total_rows);

    let json_rows: Vec<serde_json::Map<String, serde_json::Value>> = rows
        .iter()
        .take(rows_to_take)
        .map(|r| r.to_json_map())
        .collect();

    if truncated {
        warn!(
            total_rows = total_rows,
            limit = row_limit,
            "Query result truncated"
        );
    }

    Ok(QueryResult {
        columns,
        rows: json_rows,
        truncated,
        execution_time_ms,
    })
}

// =============================================================================
// Common Helper Functions
// =============================================================================

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, statement_timeout: Duration) -> DbError {
    DbError::timeout(operation, statement_timeout.as_secs() as u32)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::MySqlPool;
    use sqlx::mysql::{MySqlArguments, MySqlRow};

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        statement_timeout: Duration,
    ) -> DbResult<Vec<MySqlRow>> {
        // When params is empty, use raw SQL to avoid prepared statement issues
        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            let stream = pool.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(statement_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", statement_timeout)),
        }
    }

    pub async fn execute_write(
        pool: &MySqlPool,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<u64> {
        // When params is empty, execute raw SQL directly to avoid prepared
        // statement issues (some SQL like CREATE PROCEDURE doesn't support
        // prepared statements)
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(statement_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(statement_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write statement", statement_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::MySql, MySqlArguments>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
        match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
            QueryParam::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}

mod postgres {
    use super::*;
    use sqlx::PgPool;
    use sqlx::postgres::{PgArguments, PgRow};

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        statement_timeout: Duration,
    ) -> DbResult<Vec<PgRow>> {
        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            let stream = pool.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(statement_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", statement_timeout)),
        }
    }

    pub async fn execute_write(
        pool: &PgPool,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(statement_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(statement_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write statement", statement_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
            QueryParam::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::{SqliteArguments, SqliteRow};

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        params: &[QueryParam],
        row_limit: u32,
        statement_timeout: Duration,
    ) -> DbResult<Vec<SqliteRow>> {
        let fetch_limit = row_limit as usize + 1;
        let rows_future = if params.is_empty() {
            use sqlx::Executor;
            let stream = pool.fetch(sql);
            stream.take(fetch_limit).collect::<Vec<_>>()
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            let stream = query.fetch(pool);
            stream.take(fetch_limit).collect::<Vec<_>>()
        };

        match timeout(statement_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", statement_timeout)),
        }
    }

    pub async fn execute_write(
        pool: &SqlitePool,
        sql: &str,
        params: &[QueryParam],
        statement_timeout: Duration,
    ) -> DbResult<u64> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            timeout(statement_timeout, pool.execute(sql)).await
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_param(query, param);
            }
            timeout(statement_timeout, query.execute(pool)).await
        };

        match result {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(timeout_error("write statement", statement_timeout)),
        }
    }

    fn bind_param<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
        param: &'q QueryParam,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::Int(v) => query.bind(*v),
            QueryParam::Float(v) => query.bind(*v),
            QueryParam::String(v) => query.bind(v.as_str()),
            QueryParam::Bytes(v) => query.bind(v.as_slice()),
        }
    }
}
