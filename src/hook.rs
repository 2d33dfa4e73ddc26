//! Executor hooks.
//!
//! A hook registered on a database connection is invoked around every
//! statement the executor runs, success or failure. The stock [`TracingHook`]
//! logs statements and timing through `tracing`.

use crate::error::DbError;
use std::time::Duration;

/// Observer invoked around statement execution.
///
/// Implementations must be cheap: hooks run inline on the query path.
pub trait ExecutorHook: Send + Sync {
    /// Called before a statement is sent to the database.
    fn before_statement(&self, database: &str, sql: &str) {
        let _ = (database, sql);
    }

    /// Called after a statement finishes. `error` is `None` on success.
    fn after_statement(
        &self,
        database: &str,
        sql: &str,
        error: Option<&DbError>,
        elapsed: Duration,
    ) {
        let _ = (database, sql, error, elapsed);
    }
}

/// Hook that logs every statement through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl ExecutorHook for TracingHook {
    fn before_statement(&self, database: &str, sql: &str) {
        tracing::debug!(database = %database, sql = %sql, "Executing statement");
    }

    fn after_statement(
        &self,
        database: &str,
        sql: &str,
        error: Option<&DbError>,
        elapsed: Duration,
    ) {
        match error {
            None => tracing::debug!(
                database = %database,
                sql = %sql,
                elapsed_ms = elapsed.as_millis() as u64,
                "Statement finished"
            ),
            Some(e) => tracing::warn!(
                database = %database,
                sql = %sql,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Statement failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHook {
        seen: Mutex<Vec<String>>,
    }

    impl ExecutorHook for RecordingHook {
        fn before_statement(&self, _database: &str, sql: &str) {
            self.seen.lock().unwrap().push(format!("before:{sql}"));
        }

        fn after_statement(
            &self,
            _database: &str,
            sql: &str,
            error: Option<&DbError>,
            _elapsed: Duration,
        ) {
            let tag = if error.is_some() { "err" } else { "ok" };
            self.seen.lock().unwrap().push(format!("after:{tag}:{sql}"));
        }
    }

    #[test]
    fn test_hook_default_methods_are_noops() {
        struct Silent;
        impl ExecutorHook for Silent {}

        let hook = Silent;
        hook.before_statement("db", "SELECT 1");
        hook.after_statement("db", "SELECT 1", None, Duration::from_millis(1));
    }

    #[test]
    fn test_recording_hook_sees_both_phases() {
        let hook = RecordingHook::default();
        hook.before_statement("db", "SELECT 1");
        hook.after_statement("db", "SELECT 1", None, Duration::from_millis(1));

        let seen = hook.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["before:SELECT 1", "after:ok:SELECT 1"]);
    }
}
