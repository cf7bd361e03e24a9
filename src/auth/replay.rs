//! Replay Guard
//!
//! Records consumed (identity, nonce) pairs and rejects duplicates. The
//! recording is a single atomic conditional write against the store - the
//! race between check and insert is exactly the bug this module exists to
//! not have: two concurrent requests with the same nonce must admit one.
//!
//! Retention is bounded: entries older than the TTL are purged
//! opportunistically on the admission path, so replay protection is **not
//! unconditional**. A nonce may be legally reused after it ages out; that is
//! the accepted tradeoff against unbounded storage, and tests must not
//! assume otherwise.

use std::sync::Arc;

use crate::error::ServiceError;
use crate::store::{keys, RecordStore};

/// Nonce admission over the shared record store.
pub struct ReplayGuard<S: RecordStore> {
    store: Arc<S>,
    ttl_secs: i64,
}

impl<S: RecordStore> ReplayGuard<S> {
    /// Create a guard with the given retention TTL in seconds.
    pub fn new(store: Arc<S>, ttl_secs: i64) -> Self {
        Self { store, ttl_secs }
    }

    /// Attempt to consume `(player_id, nonce)`.
    ///
    /// `timestamp` is the request's validated timestamp and is what the
    /// retention window is measured against; `now` drives the opportunistic
    /// eviction sweep. Only called after the signature has been accepted, so
    /// unauthenticated traffic never grows the nonce set.
    pub fn admit(
        &self,
        player_id: &str,
        nonce: &str,
        timestamp: i64,
        now: i64,
    ) -> Result<(), ServiceError> {
        // Inline cleanup keeps the set bounded without a background sweep;
        // correctness does not depend on when (or whether) it runs.
        self.evict_expired(now)?;

        let key = keys::nonce(player_id, nonce);
        if self.store.insert_if_absent(&key, &timestamp.to_string())? {
            Ok(())
        } else {
            Err(ServiceError::ReplayDetected)
        }
    }

    /// Purge nonces that have aged out of the retention window.
    ///
    /// Returns the number of evicted entries.
    pub fn evict_expired(&self, now: i64) -> Result<usize, ServiceError> {
        let records = self.store.scan_prefix(keys::NONCE_PREFIX)?;
        let expired = expired_nonce_keys(&records, now, self.ttl_secs);
        let mut evicted = 0;
        for key in expired {
            if self.store.remove(&key)? {
                evicted += 1;
            }
        }
        Ok(evicted)
    }
}

/// Which of `records` have aged out at `now`.
///
/// Pure over its inputs so eviction can be tested independently of the
/// store. Entries whose stored timestamp fails to parse are treated as
/// expired and reclaimed.
pub fn expired_nonce_keys(
    records: &[(String, String)],
    now: i64,
    ttl_secs: i64,
) -> Vec<String> {
    let cutoff = now - ttl_secs.max(1);
    records
        .iter()
        .filter(|(_, ts)| ts.parse::<i64>().map(|t| t < cutoff).unwrap_or(true))
        .map(|(key, _)| key.clone())
        .collect()
}
