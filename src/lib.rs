//! # Tidemark
//!
//! Exactly-once PostgreSQL schema migration runner for the `may` runtime.
//!
//! Migrations are plain `<id>_<name>.sql` files (or `.gen` files backed by a
//! registered SQL generator) applied in strictly ascending id order, tracked
//! in a `migrations` table, hash-verified against post-hoc edits, and
//! serialized across concurrent processes with a database advisory lock.

pub mod checksum;
pub mod config;
pub mod connection;
pub mod create;
pub mod error;
pub mod executor;
pub mod file;
pub mod generator;
pub mod loader;
pub mod lock;
pub mod migrate;
pub mod record;
pub mod runner;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ConnectionParams;
pub use connection::connect;
pub use error::MigrateError;
pub use executor::{DbError, MayPostgresExecutor, SqlExecutor};
pub use file::MigrationFile;
pub use generator::GeneratorRegistry;
pub use loader::load_migration_files;
pub use migrate::Migrator;
pub use record::MigrationRecord;
pub use runner::DISABLE_TRANSACTION_DIRECTIVE;
