//! Database bootstrap: create the target database if it is absent
//!
//! Runs against the administrative database before the migration connection
//! is opened. "Database already exists" is success; everything else is
//! surfaced, wrapped with the target database name.

use crate::config::ConnectionParams;
use crate::connection::connect;
use crate::error::MigrateError;
use may_postgres::error::SqlState;

/// Issue `CREATE DATABASE` for the target database via the administrative
/// database, treating an existing database as success.
///
/// # Errors
///
/// Returns `MigrateError::Connection` if the administrative database is
/// unreachable or the creation fails for any reason other than the database
/// already existing.
pub fn ensure_database_exists(params: &ConnectionParams) -> Result<(), MigrateError> {
    let admin_database = params.admin_database();
    log::info!(
        "Ensuring database '{}' exists (via '{admin_database}')",
        params.database
    );

    let client =
        connect(&params.connection_string(admin_database)).map_err(|e| MigrateError::Connection {
            detail: format!(
                "error connecting to '{admin_database}' to create database '{}': {e}",
                params.database
            ),
        })?;

    let create_sql = format!("CREATE DATABASE \"{}\"", quote_ident(&params.database));

    match client.batch_execute(&create_sql) {
        Ok(()) => {
            log::info!("Created database '{}'", params.database);
            Ok(())
        }
        Err(e) if e.code() == Some(&SqlState::DUPLICATE_DATABASE) => {
            log::info!("'{}' database already exists", params.database);
            Ok(())
        }
        Err(e) => Err(MigrateError::Connection {
            detail: format!("error creating database '{}'. Caused by: {e}", params.database),
        }),
    }
}

/// Double any quotes inside an identifier destined for a quoted position.
fn quote_ident(name: &str) -> String {
    name.replace('"', "\"\"")
}
