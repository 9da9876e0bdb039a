//! `SqlExecutor` trait over `may_postgres`
//!
//! Abstracts database execution so the runner and lock code can work against
//! a direct client, a pooled connection, or a test double interchangeably.

use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;

/// Database execution error
#[derive(Debug)]
pub enum DbError {
    /// `PostgreSQL` error from `may_postgres`
    Postgres(PostgresError),
    /// Query execution error
    Query(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Postgres(e) => write!(f, "PostgreSQL error: {e}"),
            DbError::Query(s) => write!(f, "Query error: {s}"),
            DbError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<PostgresError> for DbError {
    fn from(err: PostgresError) -> Self {
        DbError::Postgres(err)
    }
}

/// Trait for executing database operations.
///
/// Calls are written in blocking style; on the `may` runtime they suspend the
/// invoking coroutine rather than blocking the thread.
pub trait SqlExecutor {
    /// Execute a single statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if preparation or execution fails.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError>;

    /// Execute a query expected to return exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if execution fails or the query does not return
    /// exactly one row.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError>;

    /// Execute a query and return all rows.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if execution fails.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError>;

    /// Execute raw SQL that may contain multiple statements.
    ///
    /// Migration files routinely hold several statements separated by
    /// semicolons, which the prepared-statement path cannot run.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if any statement fails.
    fn batch_execute(&self, query: &str) -> Result<(), DbError>;
}

/// `SqlExecutor` backed directly by a `may_postgres::Client`.
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`.
    ///
    /// `Client` is a shared handle; cloning one into an executor does not
    /// take over the connection's lifecycle.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client.
    pub fn into_client(self) -> Client {
        self.client
    }
}

impl SqlExecutor for MayPostgresExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.client
            .execute(query, params)
            .map_err(DbError::Postgres)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        self.client
            .query_one(query, params)
            .map_err(DbError::Postgres)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        self.client.query(query, params).map_err(DbError::Postgres)
    }

    fn batch_execute(&self, query: &str) -> Result<(), DbError> {
        self.client.batch_execute(query).map_err(DbError::Postgres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_display() {
        let err = DbError::Query("bad statement".to_string());
        assert!(err.to_string().contains("Query error"));
        assert!(err.to_string().contains("bad statement"));
    }

    #[test]
    fn test_db_error_other_display() {
        let err = DbError::Other("boom".to_string());
        assert!(err.to_string().contains("Execution error"));
    }
}
