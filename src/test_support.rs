//! Test double for `SqlExecutor`
//!
//! Records every statement it is handed, optionally failing when a statement
//! contains a configured substring. Row-producing queries always error: the
//! mock cannot fabricate `may_postgres::Row` values, and the code paths
//! under unit test never need them.

use crate::executor::{DbError, SqlExecutor};
use may_postgres::types::ToSql;
use may_postgres::Row;
use std::cell::RefCell;

pub(crate) struct MockExecutor {
    statements: RefCell<Vec<String>>,
    fail_on: Option<String>,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self {
            statements: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Fail any statement containing `fragment`.
    pub(crate) fn failing_on(fragment: &str) -> Self {
        Self {
            statements: RefCell::new(Vec::new()),
            fail_on: Some(fragment.to_string()),
        }
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    fn record(&self, query: &str) -> Result<(), DbError> {
        if let Some(fragment) = &self.fail_on {
            if query.contains(fragment) {
                return Err(DbError::Query(format!("forced failure on '{fragment}'")));
            }
        }
        self.statements.borrow_mut().push(query.to_string());
        Ok(())
    }
}

impl SqlExecutor for MockExecutor {
    fn execute(&self, query: &str, _params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.record(query)?;
        Ok(1)
    }

    fn query_one(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Row, DbError> {
        Err(DbError::Query(format!(
            "MockExecutor cannot produce rows (query: {query})"
        )))
    }

    fn query_all(&self, query: &str, _params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        Err(DbError::Query(format!(
            "MockExecutor cannot produce rows (query: {query})"
        )))
    }

    fn batch_execute(&self, query: &str) -> Result<(), DbError> {
        self.record(query)
    }
}
