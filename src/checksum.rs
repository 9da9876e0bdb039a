//! Content hashing for migrations
//!
//! The hash is computed over the SQL text that will be executed, never over
//! a generator's source. Two generated migrations that produce byte-identical
//! SQL therefore hash identically, so a generator can be refactored without
//! triggering a false drift failure.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 hash of a migration's SQL text.
///
/// Returns the lowercase hexadecimal digest. The result is a pure function
/// of `sql`: equal inputs always produce equal hashes.
pub fn hash_sql(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    let hash = hasher.finalize();
    format!("{:x}", hash)
}
