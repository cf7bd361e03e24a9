//! Record store trait and error type.

use thiserror::Error;

/// Failure reported by a store backend.
///
/// The core treats every backend failure as opaque and retriable; it never
/// inspects the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record store failure: {0}")]
pub struct StoreError(pub String);

/// Minimal key-value contract the backend core consumes.
///
/// Keys are namespaced strings (`"token:{hash}"`, `"nonce:{player}:{nonce}"`,
/// ...); values are either plain strings or JSON documents. Implementations
/// must provide at least read-committed atomicity for `insert_if_absent`:
/// two concurrent inserts of the same key must admit exactly one writer.
pub trait RecordStore: Send + Sync {
    /// Point lookup. `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Atomic conditional insert. Returns `Ok(true)` if the key was newly
    /// written, `Ok(false)` if it already existed (value left untouched).
    fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Unconditional write, creating or replacing the key.
    fn upsert(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Returns `Ok(true)` if the key existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Ordered scan of all entries whose key starts with `prefix`.
    ///
    /// Used outside the hot auth path: leaderboard ranking, friend listing
    /// and nonce eviction.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;
}
