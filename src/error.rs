//! Migration error taxonomy
//!
//! Every failure surfaced by this crate is one of these variants, each
//! carrying the file name or migration id it concerns. Callers can match on
//! the variant instead of string-matching messages.

use std::fmt;

/// Errors produced while loading, validating or applying migrations.
#[derive(Debug)]
pub enum MigrateError {
    /// Migrations directory is missing or unreadable
    FileSystem { path: String, detail: String },
    /// Migration file name cannot be parsed into `(id, name)`
    Naming { file_name: String },
    /// Migration ids are not a consecutive sequence starting at 0
    Ordering {
        file_name: String,
        expected: i32,
        found: i32,
    },
    /// Stored hash of an already-applied migration differs from the file's current hash
    Integrity {
        file_name: String,
        stored: String,
        computed: String,
    },
    /// Generated migration has no registered generator, or the generator returned a non-string
    Script { file_name: String, detail: String },
    /// A migration's own statements (or the tracking insert) failed; the migration was rolled back
    SqlExecution { migration: String, detail: String },
    /// Connection, authentication or database-creation failure from the backend
    Connection { detail: String },
    /// Failure to obtain or release the advisory lock
    LockAcquisition { detail: String },
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrateError::FileSystem { path, detail } => {
                write!(f, "Failed to read migrations directory '{path}': {detail}")
            }
            MigrateError::Naming { file_name } => {
                write!(
                    f,
                    "Invalid migration file name: '{file_name}'. \
                     Migration files should be named <id>_<name>.sql or <id>_<name>.gen, \
                     where <id> is a non-negative integer."
                )
            }
            MigrateError::Ordering {
                file_name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Found a non-consecutive migration ID on file: '{file_name}' \
                     (expected {expected}, found {found})"
                )
            }
            MigrateError::Integrity {
                file_name,
                stored,
                computed,
            } => {
                write!(
                    f,
                    "Hashes don't match for migration '{file_name}'.\n\
                     Stored hash:   {stored}\n\
                     Computed hash: {computed}\n\
                     This means the file was edited after it was applied."
                )
            }
            MigrateError::Script { file_name, detail } => {
                write!(f, "Invalid generated migration '{file_name}': {detail}")
            }
            MigrateError::SqlExecution { migration, detail } => {
                write!(
                    f,
                    "An error occurred running '{migration}'. Rolled back this migration. \
                     No further migrations were run. Reason: {detail}"
                )
            }
            MigrateError::Connection { detail } => {
                write!(f, "Connection error: {detail}")
            }
            MigrateError::LockAcquisition { detail } => {
                write!(f, "Migration lock error: {detail}")
            }
        }
    }
}

impl std::error::Error for MigrateError {}
