//! Migration file representation and name parsing

use crate::checksum::hash_sql;
use crate::error::MigrateError;
use once_cell::sync::Lazy;
use regex::Regex;

/// File name pattern: `<id>_<name>.<sql|gen>`, extension case-insensitive.
static FILE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_(.+)\.((?i)sql|gen)$").expect("valid file name regex"));

/// Extension pattern used to decide whether a file is a candidate at all.
/// Files that don't carry one of these extensions are ignored, not rejected.
static EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.((?i)sql|gen)$").expect("valid extension regex"));

/// How a migration's SQL is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    /// Plain `.sql` file; the file content is the SQL
    Sql,
    /// `.gen` file; the SQL comes from a registered generator
    Generated,
}

/// A single migration, ready to be ordered, verified and applied.
///
/// Constructed once per batch from on-disk content (or a generator) and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct MigrationFile {
    /// Non-negative migration id, parsed from the file name
    pub id: i32,

    /// Human-readable name (the file name's suffix)
    pub name: String,

    /// The exact SQL text that will be executed
    pub sql: String,

    /// Original file name, used in diagnostics
    pub file_name: String,

    /// SHA-256 hash of `sql`
    pub hash: String,
}

impl MigrationFile {
    /// Build a migration from its resolved SQL text, hashing it on the way in.
    pub fn new(id: i32, name: String, file_name: String, sql: String) -> Self {
        let hash = hash_sql(&sql);
        Self {
            id,
            name,
            sql,
            file_name,
            hash,
        }
    }

    /// Check whether a file name carries a recognized migration extension.
    pub fn is_candidate(file_name: &str) -> bool {
        EXTENSION_RE.is_match(file_name)
    }

    /// Parse a candidate file name into `(id, name, kind)`.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::Naming` if the name does not match
    /// `<id>_<name>.<sql|gen>` or the id does not fit an `i32`.
    pub fn parse_file_name(file_name: &str) -> Result<(i32, String, MigrationKind), MigrateError> {
        let caps = FILE_NAME_RE
            .captures(file_name)
            .ok_or_else(|| MigrateError::Naming {
                file_name: file_name.to_string(),
            })?;

        let id = caps
            .get(1)
            .map(|m| m.as_str())
            .and_then(|s| s.parse::<i32>().ok())
            .ok_or_else(|| MigrateError::Naming {
                file_name: file_name.to_string(),
            })?;

        let name = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| MigrateError::Naming {
                file_name: file_name.to_string(),
            })?;

        let kind = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(ext) if ext == "gen" => MigrationKind::Generated,
            _ => MigrationKind::Sql,
        };

        Ok((id, name, kind))
    }
}

/// DDL for the tracking table. The hash column is wide enough for a
/// SHA-256 hex digest; `executed_at` is filled in by the database.
const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS migrations (
  id integer PRIMARY KEY,
  name varchar(100) NOT NULL,
  hash varchar(64) NOT NULL,
  executed_at timestamp DEFAULT current_timestamp
)";

/// Reserved id and name of the synthetic bootstrap migration.
pub const BOOTSTRAP_ID: i32 = 0;
pub const BOOTSTRAP_NAME: &str = "create-migrations-table";

/// Build the synthetic bootstrap migration (id 0) that creates the tracking
/// table, schema-qualified when a schema name is supplied.
///
/// The hash is computed over the final SQL, so the same schema name always
/// yields the same bootstrap hash.
pub fn bootstrap_migration(schema: Option<&str>) -> MigrationFile {
    let sql = match schema {
        Some(schema) => format!(
            "CREATE SCHEMA IF NOT EXISTS {schema};\n{}",
            CREATE_TABLE_SQL.replacen(
                "IF NOT EXISTS migrations",
                &format!("IF NOT EXISTS {schema}.migrations"),
                1,
            )
        ),
        None => CREATE_TABLE_SQL.to_string(),
    };

    MigrationFile::new(
        BOOTSTRAP_ID,
        BOOTSTRAP_NAME.to_string(),
        format!("{BOOTSTRAP_ID}_{BOOTSTRAP_NAME}.sql"),
        sql,
    )
}

/// Name of the tracking table, schema-qualified when a schema is supplied.
pub fn tracking_table(schema: Option<&str>) -> String {
    match schema {
        Some(schema) => format!("{schema}.migrations"),
        None => "migrations".to_string(),
    }
}
