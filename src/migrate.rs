//! Migration batch orchestration
//!
//! One batch: connect, take the advisory lock, load and validate the
//! migration set, verify hashes of what was already applied, run everything
//! still pending in ascending id order, release the lock, close the
//! connection. Any failure aborts the remaining steps and surfaces a single
//! descriptive error.

use crate::config::ConnectionParams;
use crate::connection::with_connection;
use crate::create::ensure_database_exists;
use crate::error::MigrateError;
use crate::executor::{MayPostgresExecutor, SqlExecutor};
use crate::file::tracking_table;
use crate::generator::GeneratorRegistry;
use crate::loader::load_migration_files;
use crate::lock::AdvisoryLockGuard;
use crate::record::fetch_applied_migrations;
use crate::runner::run_migration;
use crate::validate::{validate_hashes, validate_ordering};
use may_postgres::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Applies a directory of migrations to a database exactly once each.
///
/// # Examples
///
/// ```no_run
/// use tidemark::{ConnectionParams, Migrator};
///
/// fn main() -> Result<(), tidemark::MigrateError> {
///     let mut params = ConnectionParams::new("appdb");
///     params.ensure_database_exists = true;
///
///     Migrator::new("./migrations").run(&params)
/// }
/// ```
pub struct Migrator {
    migrations_dir: PathBuf,
    generators: GeneratorRegistry,
}

impl Migrator {
    /// Create a migrator for the given migrations directory.
    pub fn new(migrations_dir: impl AsRef<Path>) -> Self {
        Self {
            migrations_dir: migrations_dir.as_ref().to_path_buf(),
            generators: GeneratorRegistry::new(),
        }
    }

    /// Supply SQL generators for `.gen` migrations.
    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    /// Run one batch with a crate-owned connection built from `params`.
    ///
    /// Creates the target database first when
    /// `params.ensure_database_exists` is set. The connection is closed on
    /// every exit path.
    ///
    /// # Errors
    ///
    /// Returns the first `MigrateError` encountered; no partial success is
    /// reported.
    pub fn run(&self, params: &ConnectionParams) -> Result<(), MigrateError> {
        if params.ensure_database_exists {
            ensure_database_exists(params)?;
        }

        with_connection(params, |client| {
            let executor = MayPostgresExecutor::new(client.clone());
            self.run_batch(&executor, params.schema.as_deref())
        })
    }

    /// Run one batch over a caller-supplied, already-connected client.
    ///
    /// Connection lifecycle stays entirely with the caller; the migrator
    /// only uses the client.
    ///
    /// # Errors
    ///
    /// Returns the first `MigrateError` encountered.
    pub fn run_with_client(
        &self,
        client: &Client,
        schema: Option<&str>,
    ) -> Result<(), MigrateError> {
        let executor = MayPostgresExecutor::new(client.clone());
        self.run_batch(&executor, schema)
    }

    /// Lock, validate and apply. Separated from the connection plumbing so
    /// both entry points share one code path.
    fn run_batch(
        &self,
        executor: &dyn SqlExecutor,
        schema: Option<&str>,
    ) -> Result<(), MigrateError> {
        // Taken outside any transaction: a waiter must not deadlock against
        // a holder running a non-transactional migration.
        let lock = AdvisoryLockGuard::acquire(executor)?;

        let applied_count = self.apply_pending(executor, schema)?;

        lock.release()?;

        if applied_count > 0 {
            log::info!("Applied {applied_count} migration(s)");
        } else {
            log::info!("No pending migrations to apply");
        }
        Ok(())
    }

    fn apply_pending(
        &self,
        executor: &dyn SqlExecutor,
        schema: Option<&str>,
    ) -> Result<usize, MigrateError> {
        let migrations = load_migration_files(&self.migrations_dir, schema, &self.generators)?;
        validate_ordering(&migrations)?;

        // Read only after the lock is held: another batch may have applied
        // migrations while this one was waiting, and finding nothing left to
        // do must be a clean no-op.
        let applied = fetch_applied_migrations(executor, schema)?;
        validate_hashes(&migrations, &applied)?;

        let applied_ids: HashSet<i32> = applied.iter().map(|r| r.id).collect();
        let table = tracking_table(schema);

        let mut count = 0;
        for migration in migrations.iter().filter(|m| !applied_ids.contains(&m.id)) {
            run_migration(executor, &table, migration)?;
            count += 1;
        }

        Ok(count)
    }
}
