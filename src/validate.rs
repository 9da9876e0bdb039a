//! Ordering and integrity validation
//!
//! Both checks run before any SQL is issued: a sequence defect or a hash
//! mismatch must never leave the database partially migrated.

use crate::error::MigrateError;
use crate::file::MigrationFile;
use crate::record::MigrationRecord;
use std::collections::HashMap;

/// Require ids to be exactly `0, 1, 2, ...` with no gaps or duplicates.
///
/// The input must already be sorted ascending by id (the loader guarantees
/// this). Index 0 is the bootstrap migration; user files continue from 1.
///
/// # Errors
///
/// Returns `MigrateError::Ordering` naming the first violating file.
pub fn validate_ordering(migrations: &[MigrationFile]) -> Result<(), MigrateError> {
    for (index, migration) in migrations.iter().enumerate() {
        let expected = index as i32;
        if migration.id != expected {
            return Err(MigrateError::Ordering {
                file_name: migration.file_name.clone(),
                expected,
                found: migration.id,
            });
        }
    }
    Ok(())
}

/// Compare each already-applied migration's stored hash to the hash computed
/// from its current content.
///
/// Only migrations with a persisted record are verified; pending files are
/// never hash-checked against each other, only against the ordering rule.
///
/// # Errors
///
/// Returns `MigrateError::Integrity` naming the first drifted file.
pub fn validate_hashes(
    migrations: &[MigrationFile],
    applied: &[MigrationRecord],
) -> Result<(), MigrateError> {
    let stored: HashMap<i32, &MigrationRecord> = applied.iter().map(|r| (r.id, r)).collect();

    for migration in migrations {
        if let Some(record) = stored.get(&migration.id) {
            if record.hash != migration.hash {
                return Err(MigrateError::Integrity {
                    file_name: migration.file_name.clone(),
                    stored: record.hash.clone(),
                    computed: migration.hash.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migration(id: i32, file_name: &str) -> MigrationFile {
        MigrationFile::new(
            id,
            format!("m{id}"),
            file_name.to_string(),
            format!("SELECT {id};"),
        )
    }

    fn record(m: &MigrationFile) -> MigrationRecord {
        MigrationRecord {
            id: m.id,
            name: m.name.clone(),
            hash: m.hash.clone(),
        }
    }

    #[test]
    fn test_ordering_accepts_consecutive_sequence() {
        let set = vec![
            migration(0, "0_bootstrap.sql"),
            migration(1, "1_a.sql"),
            migration(2, "2_b.sql"),
        ];
        assert!(validate_ordering(&set).is_ok());
    }

    #[test]
    fn test_ordering_accepts_bootstrap_only() {
        let set = vec![migration(0, "0_bootstrap.sql")];
        assert!(validate_ordering(&set).is_ok());
    }

    #[test]
    fn test_ordering_rejects_gap() {
        let set = vec![
            migration(0, "0_bootstrap.sql"),
            migration(1, "1_a.sql"),
            migration(3, "3_c.sql"),
        ];
        match validate_ordering(&set).unwrap_err() {
            MigrateError::Ordering {
                file_name,
                expected,
                found,
            } => {
                assert_eq!(file_name, "3_c.sql");
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected Ordering error, got {other}"),
        }
    }

    #[test]
    fn test_ordering_rejects_duplicate() {
        let set = vec![
            migration(0, "0_bootstrap.sql"),
            migration(1, "1_a.sql"),
            migration(1, "1_b.sql"),
        ];
        match validate_ordering(&set).unwrap_err() {
            MigrateError::Ordering { file_name, .. } => assert_eq!(file_name, "1_b.sql"),
            other => panic!("expected Ordering error, got {other}"),
        }
    }

    #[test]
    fn test_ordering_rejects_user_sequence_starting_past_one() {
        // Bootstrap at 0, then the first user file must be 1.
        let set = vec![migration(0, "0_bootstrap.sql"), migration(2, "2_a.sql")];
        match validate_ordering(&set).unwrap_err() {
            MigrateError::Ordering { file_name, .. } => assert_eq!(file_name, "2_a.sql"),
            other => panic!("expected Ordering error, got {other}"),
        }
    }

    #[test]
    fn test_hashes_match_for_unmodified_files() {
        let set = vec![migration(0, "0_bootstrap.sql"), migration(1, "1_a.sql")];
        let applied = vec![record(&set[0]), record(&set[1])];
        assert!(validate_hashes(&set, &applied).is_ok());
    }

    #[test]
    fn test_hashes_ignore_pending_migrations() {
        let set = vec![
            migration(0, "0_bootstrap.sql"),
            migration(1, "1_a.sql"),
            migration(2, "2_pending.sql"),
        ];
        // Only 0 and 1 are applied; 2 has no record and is not verified.
        let applied = vec![record(&set[0]), record(&set[1])];
        assert!(validate_hashes(&set, &applied).is_ok());
    }

    #[test]
    fn test_hashes_detect_drift() {
        let set = vec![migration(0, "0_bootstrap.sql"), migration(1, "1_a.sql")];
        let mut drifted = record(&set[1]);
        drifted.hash = "0000000000000000000000000000000000000000000000000000000000000000".into();
        let applied = vec![record(&set[0]), drifted];

        match validate_hashes(&set, &applied).unwrap_err() {
            MigrateError::Integrity { file_name, .. } => assert_eq!(file_name, "1_a.sql"),
            other => panic!("expected Integrity error, got {other}"),
        }
    }
}
