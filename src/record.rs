//! `MigrationRecord` - rows of the tracking table

use crate::error::MigrateError;
use crate::executor::SqlExecutor;
use crate::file::tracking_table;

/// One applied migration as persisted in the tracking table.
///
/// Rows are append-only: the runner inserts exactly one per migration and
/// never updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Migration id
    pub id: i32,

    /// Human-readable migration name
    pub name: String,

    /// SHA-256 hash of the SQL text as it was when applied
    pub hash: String,
}

impl MigrationRecord {
    /// Create a `MigrationRecord` from a database row.
    ///
    /// Expected column order: `id`, `name`, `hash`.
    pub fn from_row(row: &may_postgres::Row) -> Self {
        Self {
            id: row.get(0),
            name: row.get(1),
            hash: row.get(2),
        }
    }
}

/// Read all applied migrations from the tracking table, ordered by id.
///
/// Returns an empty set when the tracking table does not exist yet, which is
/// the state before the bootstrap migration has ever run. Call this only
/// after the advisory lock is held, so the answer reflects whatever a
/// concurrent batch applied while this one was waiting.
///
/// # Errors
///
/// Returns `MigrateError::Connection` if the backend rejects the queries.
pub fn fetch_applied_migrations(
    executor: &dyn SqlExecutor,
    schema: Option<&str>,
) -> Result<Vec<MigrationRecord>, MigrateError> {
    let table_schema = schema.unwrap_or("public");

    let exists_row = executor
        .query_one(
            "SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = 'migrations'
            )",
            &[&table_schema],
        )
        .map_err(|e| MigrateError::Connection {
            detail: format!("failed to check for tracking table: {e}"),
        })?;

    let exists: bool = exists_row.get(0);
    if !exists {
        log::debug!("Tracking table does not exist yet; no migrations applied");
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id, name, hash FROM {} ORDER BY id ASC",
        tracking_table(schema)
    );
    let rows = executor
        .query_all(&sql, &[])
        .map_err(|e| MigrateError::Connection {
            detail: format!("failed to read applied migrations: {e}"),
        })?;

    Ok(rows.iter().map(MigrationRecord::from_row).collect())
}
