//! Migration file discovery and loading
//!
//! Scans a directory for `<id>_<name>.sql` and `<id>_<name>.gen` files,
//! resolves each one's SQL (reading the file, or invoking the registered
//! generator), hashes the SQL, and prepends the synthetic bootstrap
//! migration. No assertion is made about the validity of the SQL itself.

use crate::error::MigrateError;
use crate::file::{bootstrap_migration, MigrationFile, MigrationKind};
use crate::generator::GeneratorRegistry;
use std::fs;
use std::path::Path;

/// Load all migrations from a directory, bootstrap included, sorted by id.
///
/// Files without a recognized extension are ignored. Files with a recognized
/// extension must parse as `<id>_<name>`; anything else is a `Naming` error.
/// `.gen` files must have a generator registered under their file name.
///
/// The returned set is sorted ascending by id but not yet validated for
/// consecutiveness; run [`crate::validate::validate_ordering`] before
/// applying anything.
///
/// # Errors
///
/// Returns `FileSystem`, `Naming` or `Script` errors as described above.
pub fn load_migration_files(
    directory: &Path,
    schema: Option<&str>,
    generators: &GeneratorRegistry,
) -> Result<Vec<MigrationFile>, MigrateError> {
    log::info!("Loading migrations from: {}", directory.display());

    let entries = fs::read_dir(directory).map_err(|e| MigrateError::FileSystem {
        path: directory.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut migrations = vec![bootstrap_migration(schema)];

    for entry in entries {
        let entry = entry.map_err(|e| MigrateError::FileSystem {
            path: directory.display().to_string(),
            detail: e.to_string(),
        })?;

        let path = entry.path();
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        if path.is_dir() || !MigrationFile::is_candidate(&file_name) {
            log::debug!("Ignoring non-migration entry: {file_name}");
            continue;
        }

        let (id, name, kind) = MigrationFile::parse_file_name(&file_name)?;

        let sql = match kind {
            MigrationKind::Sql => {
                fs::read_to_string(&path).map_err(|e| MigrateError::FileSystem {
                    path: path.display().to_string(),
                    detail: e.to_string(),
                })?
            }
            MigrationKind::Generated => generators.generate(&file_name)?,
        };

        log::debug!("Loaded migration file: {file_name} (id {id})");
        migrations.push(MigrationFile::new(id, name, file_name, sql));
    }

    // Tie-break duplicate ids by file name so the subsequent ordering check
    // names the same violator regardless of directory iteration order.
    migrations.sort_by(|a, b| (a.id, a.file_name.as_str()).cmp(&(b.id, b.file_name.as_str())));

    log::info!(
        "Found {} migration(s) including bootstrap",
        migrations.len()
    );

    Ok(migrations)
}
