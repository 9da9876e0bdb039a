//! Advisory-lock coordination across concurrent batches
//!
//! Every runner targeting the same database takes the same session-level
//! advisory lock before touching the tracking table, so two racing
//! invocations serialize instead of applying migrations twice. The lock is
//! taken outside any transaction: a migration carrying the
//! disable-transaction directive (e.g. `CREATE INDEX CONCURRENTLY`) must not
//! leave a waiter deadlocked against a holder inside a transaction.

use crate::error::MigrateError;
use crate::executor::SqlExecutor;

/// Fixed lock key shared by every runner targeting the same database.
/// The value is the ASCII bytes of "tidemark" as a big-endian i64.
pub const ADVISORY_LOCK_KEY: i64 = 0x7469_6465_6d61_726b;

/// Guard holding the advisory lock for one migration batch.
///
/// Release explicitly with [`AdvisoryLockGuard::release`] on the success
/// path so a failure to unlock is surfaced; on error paths the guard's
/// `Drop` makes a best-effort release and swallows any failure.
pub struct AdvisoryLockGuard<'a> {
    executor: &'a dyn SqlExecutor,
    released: bool,
}

impl<'a> AdvisoryLockGuard<'a> {
    /// Take the advisory lock, suspending the calling coroutine until it is
    /// granted.
    ///
    /// A second concurrent batch blocks here rather than racing; when it
    /// wakes up it must re-read the tracking table before deciding what is
    /// still pending.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::LockAcquisition` if the backend rejects the
    /// lock query.
    pub fn acquire(executor: &'a dyn SqlExecutor) -> Result<Self, MigrateError> {
        log::debug!("Acquiring advisory lock {ADVISORY_LOCK_KEY}...");
        executor
            .execute("SELECT pg_advisory_lock($1)", &[&ADVISORY_LOCK_KEY])
            .map_err(|e| MigrateError::LockAcquisition {
                detail: format!("failed to acquire advisory lock: {e}"),
            })?;
        log::debug!("... advisory lock acquired");

        Ok(Self {
            executor,
            released: false,
        })
    }

    /// Release the lock, surfacing any failure.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::LockAcquisition` if the unlock query fails.
    pub fn release(mut self) -> Result<(), MigrateError> {
        self.released = true;
        release_lock(self.executor).map_err(|e| MigrateError::LockAcquisition {
            detail: format!("failed to release advisory lock: {e}"),
        })?;
        log::debug!("Advisory lock released");
        Ok(())
    }
}

impl Drop for AdvisoryLockGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            // Errors cannot propagate out of drop; the session closing will
            // release the lock anyway.
            if let Err(e) = release_lock(self.executor) {
                log::warn!("Failed to release advisory lock during cleanup: {e}");
            }
        }
    }
}

fn release_lock(executor: &dyn SqlExecutor) -> Result<(), crate::executor::DbError> {
    executor.execute("SELECT pg_advisory_unlock($1)", &[&ADVISORY_LOCK_KEY])?;
    Ok(())
}
