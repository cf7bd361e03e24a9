//! Friend Graph
//!
//! Joining by code establishes a symmetric friendship: both directed edges
//! are written with idempotent conditional inserts, so retrying a join after
//! a network failure is a silent no-op rather than an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::PlayerProfile;
use crate::error::ServiceError;
use crate::store::{keys, RecordStore};

/// Friends returned per listing call.
pub const FRIEND_LIST_LIMIT: usize = 50;

/// One entry in a friend listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    /// Friend's identity.
    pub player_id: String,
    /// Friend's display label.
    pub display_name: String,
}

/// Friend-graph operations over the shared store.
pub struct FriendGraph<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> FriendGraph<S> {
    /// Create a graph over the shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Establish a friendship from a presented join code.
    ///
    /// Codes are normalized (trimmed, uppercased) before resolution.
    /// Self-joins are rejected; re-joining an existing friend succeeds
    /// without touching the edges.
    pub fn join_by_code(
        &self,
        player_id: &str,
        code: &str,
        now: i64,
    ) -> Result<(), ServiceError> {
        let code = code.trim().to_uppercase();
        if code.len() < 4 {
            return Err(ServiceError::InvalidPayload("invalid code".to_string()));
        }

        let target = self
            .store
            .get(&keys::code(&code))?
            .ok_or(ServiceError::CodeNotFound)?;

        if target == player_id {
            return Err(ServiceError::SelfJoinRejected);
        }

        // Both directions, each an insert-if-absent; the pair is what makes
        // the relation symmetric and the conditionality what makes it
        // idempotent.
        self.store
            .insert_if_absent(&keys::friend(player_id, &target), &now.to_string())?;
        self.store
            .insert_if_absent(&keys::friend(&target, player_id), &now.to_string())?;
        Ok(())
    }

    /// List a player's friends, ordered by display name, capped at
    /// [`FRIEND_LIST_LIMIT`].
    pub fn list(&self, player_id: &str) -> Result<Vec<FriendEntry>, ServiceError> {
        let prefix = keys::friend_prefix(player_id);
        let mut entries = Vec::new();

        for (key, _) in self.store.scan_prefix(&prefix)? {
            let friend_id = &key[prefix.len()..];
            let display_name = match self.store.get(&keys::player(friend_id))? {
                Some(doc) => serde_json::from_str::<PlayerProfile>(&doc)
                    .map_err(|e| ServiceError::Storage(e.to_string()))?
                    .display_name,
                // Edge to a profile that no longer exists; skip rather than fail the listing.
                None => continue,
            };
            entries.push(FriendEntry {
                player_id: friend_id.to_string(),
                display_name,
            });
        }

        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        entries.truncate(FRIEND_LIST_LIMIT);
        Ok(entries)
    }

    /// Whether a directed edge exists (test and admin visibility).
    pub fn are_friends(&self, player_id: &str, friend_id: &str) -> Result<bool, ServiceError> {
        Ok(self.store.get(&keys::friend(player_id, friend_id))?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialIssuer;
    use crate::social::code::JoinCodeAllocator;
    use crate::store::MemoryStore;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        graph: FriendGraph<MemoryStore>,
        codes: JoinCodeAllocator<MemoryStore>,
        issuer: CredentialIssuer<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        Fixture {
            graph: FriendGraph::new(Arc::clone(&store)),
            codes: JoinCodeAllocator::new(Arc::clone(&store)),
            issuer: CredentialIssuer::new(store, "salt"),
        }
    }

    fn player(f: &Fixture, device: &str) -> String {
        f.issuer.issue(device, NOW).unwrap().player_id
    }

    #[test]
    fn test_join_is_symmetric() {
        let f = fixture();
        let a = player(&f, "dev-a");
        let b = player(&f, "dev-b");
        let code_b = f.codes.allocate_or_get(&b).unwrap();

        f.graph.join_by_code(&a, &code_b, NOW).unwrap();

        assert!(f.graph.are_friends(&a, &b).unwrap());
        assert!(f.graph.are_friends(&b, &a).unwrap());
        assert_eq!(f.graph.list(&a).unwrap().len(), 1);
        assert_eq!(f.graph.list(&b).unwrap().len(), 1);
    }

    #[test]
    fn test_join_is_idempotent() {
        let f = fixture();
        let a = player(&f, "dev-a");
        let b = player(&f, "dev-b");
        let code_b = f.codes.allocate_or_get(&b).unwrap();

        f.graph.join_by_code(&a, &code_b, NOW).unwrap();
        // Retry after a simulated network failure: silent no-op.
        f.graph.join_by_code(&a, &code_b, NOW + 5).unwrap();

        assert_eq!(f.graph.list(&a).unwrap().len(), 1);
        assert_eq!(f.graph.list(&b).unwrap().len(), 1);
    }

    #[test]
    fn test_self_join_rejected() {
        let f = fixture();
        let a = player(&f, "dev-a");
        let code_a = f.codes.allocate_or_get(&a).unwrap();

        assert_eq!(
            f.graph.join_by_code(&a, &code_a, NOW),
            Err(ServiceError::SelfJoinRejected)
        );
        assert!(f.graph.list(&a).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_code_rejected() {
        let f = fixture();
        let a = player(&f, "dev-a");
        assert_eq!(
            f.graph.join_by_code(&a, "ZZZZ99", NOW),
            Err(ServiceError::CodeNotFound)
        );
    }

    #[test]
    fn test_short_code_rejected_before_lookup() {
        let f = fixture();
        let a = player(&f, "dev-a");
        assert!(matches!(
            f.graph.join_by_code(&a, "AB", NOW),
            Err(ServiceError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_code_normalized_before_resolution() {
        let f = fixture();
        let a = player(&f, "dev-a");
        let b = player(&f, "dev-b");
        let code_b = f.codes.allocate_or_get(&b).unwrap();

        f.graph
            .join_by_code(&a, &format!("  {}  ", code_b.to_lowercase()), NOW)
            .unwrap();
        assert!(f.graph.are_friends(&a, &b).unwrap());
    }

    #[test]
    fn test_list_ordered_by_display_name() {
        let f = fixture();
        let me = player(&f, "dev-me");
        for i in 0..5 {
            let other = player(&f, &format!("dev-{}", i));
            let code = f.codes.allocate_or_get(&other).unwrap();
            f.graph.join_by_code(&me, &code, NOW).unwrap();
        }

        let listed = f.graph.list(&me).unwrap();
        assert_eq!(listed.len(), 5);
        for pair in listed.windows(2) {
            assert!(pair[0].display_name <= pair[1].display_name);
        }
    }
}
