//! Credential Issuer
//!
//! Mints bearer credentials and binds them to player identities. The model
//! is single-session-per-identity: issuing a new credential overwrites the
//! stored hash, so only the most recently issued credential is ever valid
//! and rotation doubles as revocation - no revocation lists needed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::token::{new_token, token_sha256};
use crate::error::ServiceError;
use crate::store::{keys, RecordStore};

/// Persistent player record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Stable opaque identifier, never reused.
    pub player_id: String,
    /// Device the identity was first created from.
    pub device_id: String,
    /// Generated display label.
    pub display_name: String,
    /// Leaderboard region.
    pub region: String,
    /// Unix seconds at creation.
    pub created_at: i64,
}

/// Result of one issue call: the identity plus the plaintext credential.
///
/// The plaintext exists only here; the store holds its salted hash.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// Identity the credential is bound to.
    pub player_id: String,
    /// Plaintext bearer credential for the client to present.
    pub token: String,
}

/// Issues and resolves bearer credentials against the record store.
pub struct CredentialIssuer<S: RecordStore> {
    store: Arc<S>,
    token_salt: String,
}

impl<S: RecordStore> CredentialIssuer<S> {
    /// Create an issuer using `token_salt` for credential hashing.
    pub fn new(store: Arc<S>, token_salt: impl Into<String>) -> Self {
        Self {
            store,
            token_salt: token_salt.into(),
        }
    }

    /// Authenticate a device, creating the identity on first contact.
    ///
    /// A device identifier resolves to at most one identity: re-auth from a
    /// known device reuses the identity and rotates its credential. An empty
    /// device id gets a generated one so curl-style demo calls still work.
    pub fn issue(&self, device_id: &str, now: i64) -> Result<IssuedCredential, ServiceError> {
        let device_id = device_id.trim();
        let device_id = if device_id.is_empty() {
            format!("demo-{}", Uuid::new_v4().simple())
        } else {
            device_id.to_string()
        };

        if let Some(player_id) = self.store.get(&keys::device(&device_id))? {
            let token = self.rotate_credential(&player_id)?;
            return Ok(IssuedCredential { player_id, token });
        }

        let player_id = format!("p_{}", Uuid::new_v4().simple());
        let profile = PlayerProfile {
            player_id: player_id.clone(),
            device_id: device_id.clone(),
            display_name: display_name_for(&player_id),
            region: "KR".to_string(),
            created_at: now,
        };

        // The device binding is the uniqueness point. Losing this race means
        // another request just created the identity for this device; fall
        // back to whatever it bound.
        if !self
            .store
            .insert_if_absent(&keys::device(&device_id), &player_id)?
        {
            let player_id = self
                .store
                .get(&keys::device(&device_id))?
                .ok_or_else(|| ServiceError::Storage("device binding vanished".to_string()))?;
            let token = self.rotate_credential(&player_id)?;
            return Ok(IssuedCredential { player_id, token });
        }

        let doc = serde_json::to_string(&profile)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        self.store.upsert(&keys::player(&player_id), &doc)?;

        let token = self.rotate_credential(&player_id)?;
        Ok(IssuedCredential { player_id, token })
    }

    /// Resolve a presented bearer credential to its identity.
    ///
    /// The per-identity `cred:` pointer is authoritative: a `token:` row
    /// only authenticates while it is the pointer's current hash. Two
    /// rotations racing for the same identity can leave the loser's
    /// `token:` row behind, so the row alone must never be trusted; stale
    /// rows found here are reclaimed.
    pub fn resolve(&self, token: &str) -> Result<String, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::MissingCredential);
        }
        let hash = token_sha256(token, &self.token_salt);
        let player_id = self
            .store
            .get(&keys::token(&hash))?
            .ok_or(ServiceError::InvalidCredential)?;

        match self.store.get(&keys::credential(&player_id))? {
            Some(current) if current == hash => Ok(player_id),
            _ => {
                self.store.remove(&keys::token(&hash))?;
                Err(ServiceError::InvalidCredential)
            }
        }
    }

    /// Load a player profile document.
    pub fn profile(&self, player_id: &str) -> Result<Option<PlayerProfile>, ServiceError> {
        match self.store.get(&keys::player(player_id))? {
            Some(doc) => serde_json::from_str(&doc)
                .map(Some)
                .map_err(|e| ServiceError::Storage(e.to_string())),
            None => Ok(None),
        }
    }

    /// Mint a fresh credential for `player_id`, invalidating the previous
    /// one. The superseded hash row is removed and the `cred:` pointer
    /// advanced; a row a racing rotation fails to remove still cannot
    /// authenticate, because `resolve` trusts only the pointer.
    fn rotate_credential(&self, player_id: &str) -> Result<String, ServiceError> {
        let token = new_token();
        let hash = token_sha256(&token, &self.token_salt);

        if let Some(old_hash) = self.store.get(&keys::credential(player_id))? {
            self.store.remove(&keys::token(&old_hash))?;
        }
        self.store.upsert(&keys::token(&hash), player_id)?;
        self.store.upsert(&keys::credential(player_id), &hash)?;

        Ok(token)
    }
}

/// Display label for a fresh identity: `Guest-` plus the id's tail.
fn display_name_for(player_id: &str) -> String {
    let tail: String = player_id
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("Guest-{}", tail.to_uppercase())
}
