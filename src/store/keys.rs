//! Keyspace layout.
//!
//! One ordered keyspace with table-style prefixes. Keeping every constructor
//! here makes the layout auditable in one place and keeps prefix scans and
//! point lookups from drifting apart.

/// Player profile document: `player:{player_id}`.
pub fn player(player_id: &str) -> String {
    format!("player:{player_id}")
}

/// Device binding: `device:{device_id}` -> player id.
pub fn device(device_id: &str) -> String {
    format!("device:{device_id}")
}

/// Credential-hash lookup: `token:{hash}` -> player id.
pub fn token(token_hash: &str) -> String {
    format!("token:{token_hash}")
}

/// Current credential hash per identity: `cred:{player_id}` -> hash.
/// Exists so rotation can delete the superseded `token:` row.
pub fn credential(player_id: &str) -> String {
    format!("cred:{player_id}")
}

/// Consumed nonce: `nonce:{player_id}:{nonce}` -> validated-at timestamp.
pub fn nonce(player_id: &str, nonce: &str) -> String {
    format!("nonce:{player_id}:{nonce}")
}

/// Prefix covering every consumed nonce (eviction scan).
pub const NONCE_PREFIX: &str = "nonce:";

/// Join-code ownership: `code:{CODE}` -> player id.
pub fn code(code: &str) -> String {
    format!("code:{code}")
}

/// Reverse join-code lookup: `player_code:{player_id}` -> code.
pub fn player_code(player_id: &str) -> String {
    format!("player_code:{player_id}")
}

/// Directed friend edge: `friend:{player_id}:{friend_id}` -> created-at.
pub fn friend(player_id: &str, friend_id: &str) -> String {
    format!("friend:{player_id}:{friend_id}")
}

/// Prefix covering one player's outgoing friend edges.
pub fn friend_prefix(player_id: &str) -> String {
    format!("friend:{player_id}:")
}

/// Leaderboard row: `score:{REGION}:{player_id}` -> score document.
pub fn score(region: &str, player_id: &str) -> String {
    format!("score:{region}:{player_id}")
}

/// Prefix covering one region's leaderboard rows.
pub fn score_prefix(region: &str) -> String {
    format!("score:{region}:")
}

/// Telemetry event row: `event:{player_id}:{event_id}`.
pub fn event(player_id: &str, event_id: &str) -> String {
    format!("event:{player_id}:{event_id}")
}
