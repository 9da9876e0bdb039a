//! Transactional application of a single migration
//!
//! Per migration: `START TRANSACTION`, run the migration's SQL, insert the
//! tracking row in the same transaction, `COMMIT`. A migration whose SQL
//! carries the disable-transaction directive runs bare, because statements
//! like `CREATE INDEX CONCURRENTLY` refuse to run inside a transaction.

use crate::error::MigrateError;
use crate::executor::SqlExecutor;
use crate::file::MigrationFile;

/// Marker comment that opts a migration out of transaction wrapping.
pub const DISABLE_TRANSACTION_DIRECTIVE: &str = "-- tidemark disable-transaction";

/// Apply one migration and record it in the tracking table.
///
/// On failure the transaction is rolled back best-effort (a secondary
/// rollback failure is logged, not surfaced) and a `SqlExecution` error
/// naming the migration is returned. The caller must not attempt any later
/// migration in the batch after an error.
///
/// # Errors
///
/// Returns `MigrateError::SqlExecution` if the migration's SQL or the
/// tracking insert fails.
pub fn run_migration(
    executor: &dyn SqlExecutor,
    table: &str,
    migration: &MigrationFile,
) -> Result<(), MigrateError> {
    let in_transaction = !migration.sql.contains(DISABLE_TRANSACTION_DIRECTIVE);
    log::debug!(
        "Running migration {} in transaction: {in_transaction}",
        migration.file_name
    );

    let result = apply(executor, table, migration, in_transaction);

    if let Err(detail) = result {
        if in_transaction {
            if let Err(rollback_err) = executor.batch_execute("ROLLBACK") {
                log::warn!(
                    "Rollback after failed migration '{}' also failed: {rollback_err}",
                    migration.file_name
                );
            }
        }
        return Err(MigrateError::SqlExecution {
            migration: migration.name.clone(),
            detail,
        });
    }

    log::info!("Applied migration {}", migration.file_name);
    Ok(())
}

fn apply(
    executor: &dyn SqlExecutor,
    table: &str,
    migration: &MigrationFile,
    in_transaction: bool,
) -> Result<(), String> {
    if in_transaction {
        executor
            .batch_execute("START TRANSACTION")
            .map_err(|e| e.to_string())?;
    }

    executor
        .batch_execute(&migration.sql)
        .map_err(|e| e.to_string())?;

    let insert_sql =
        format!("INSERT INTO {table} (id, name, hash) VALUES ($1, $2, $3)");
    executor
        .execute(
            &insert_sql,
            &[&migration.id, &migration.name, &migration.hash],
        )
        .map_err(|e| e.to_string())?;
    log::debug!(
        "Recorded migration in '{table}': {} | {} | {}",
        migration.id,
        migration.name,
        migration.hash
    );

    if in_transaction {
        executor.batch_execute("COMMIT").map_err(|e| e.to_string())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockExecutor;

    fn migration(sql: &str) -> MigrationFile {
        MigrationFile::new(
            1,
            "create_things".to_string(),
            "1_create_things.sql".to_string(),
            sql.to_string(),
        )
    }

    #[test]
    fn test_success_wraps_in_transaction() {
        let executor = MockExecutor::new();
        let m = migration("CREATE TABLE things (id int);");

        run_migration(&executor, "migrations", &m).unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[0], "START TRANSACTION");
        assert_eq!(statements[1], m.sql);
        assert!(statements[2].starts_with("INSERT INTO migrations"));
        assert_eq!(statements[3], "COMMIT");
    }

    #[test]
    fn test_directive_skips_transaction() {
        let executor = MockExecutor::new();
        let m = migration(
            "-- tidemark disable-transaction\nCREATE INDEX CONCURRENTLY idx ON things (id);",
        );

        run_migration(&executor, "migrations", &m).unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], m.sql);
        assert!(statements[1].starts_with("INSERT INTO migrations"));
    }

    #[test]
    fn test_failure_rolls_back_and_names_migration() {
        let executor = MockExecutor::failing_on("CREATE TABLE");
        let m = migration("CREATE TABLE things (id int);");

        let err = run_migration(&executor, "migrations", &m).unwrap_err();
        match &err {
            MigrateError::SqlExecution { migration, .. } => {
                assert_eq!(migration, "create_things");
            }
            other => panic!("expected SqlExecution error, got {other}"),
        }
        assert!(err.to_string().contains("Rolled back"));

        let statements = executor.statements();
        assert_eq!(statements.last().unwrap(), "ROLLBACK");
        // The tracking insert must never have run.
        assert!(!statements.iter().any(|s| s.starts_with("INSERT")));
    }

    #[test]
    fn test_failing_tracking_insert_rolls_back() {
        let executor = MockExecutor::failing_on("INSERT INTO");
        let m = migration("CREATE TABLE things (id int);");

        assert!(run_migration(&executor, "migrations", &m).is_err());
        let statements = executor.statements();
        assert_eq!(statements.last().unwrap(), "ROLLBACK");
        assert!(!statements.contains(&"COMMIT".to_string()));
    }

    #[test]
    fn test_failure_without_transaction_does_not_roll_back() {
        let executor = MockExecutor::failing_on("CREATE INDEX");
        let m = migration(
            "-- tidemark disable-transaction\nCREATE INDEX CONCURRENTLY idx ON things (id);",
        );

        assert!(run_migration(&executor, "migrations", &m).is_err());
        assert!(!executor.statements().contains(&"ROLLBACK".to_string()));
    }

    #[test]
    fn test_schema_qualified_tracking_insert() {
        let executor = MockExecutor::new();
        let m = migration("SELECT 1;");

        run_migration(&executor, "myapp.migrations", &m).unwrap();

        assert!(executor
            .statements()
            .iter()
            .any(|s| s.starts_with("INSERT INTO myapp.migrations")));
    }
}
