//! # Sizzle Backend
//!
//! Backend core for a mobile idle game: player identity, leaderboard,
//! social graph and telemetry, guarded by a signed-request authentication
//! and replay-protection protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SIZZLE BACKEND                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  store/          - Shared state (the only shared state)     │
//! │  ├── record.rs   - RecordStore collaborator trait            │
//! │  ├── memory.rs   - In-memory implementation                  │
//! │  └── keys.rs     - Keyspace layout                           │
//! │                                                              │
//! │  auth/           - Security core                             │
//! │  ├── token.rs    - Credential generation + salted hashing    │
//! │  ├── signature.rs- HMAC envelope + body signatures           │
//! │  ├── replay.rs   - Nonce admission with bounded retention    │
//! │  └── issuer.rs   - Credential issuance and rotation          │
//! │                                                              │
//! │  social/         - Join codes and the friend graph           │
//! │  leaderboard.rs  - Best-score rankings per region            │
//! │  telemetry.rs    - Analytics event ingest                    │
//! │  service.rs      - Facade the request handlers call          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Request Gate Sequence
//!
//! Every protected call passes four gates, in order: the bearer credential
//! resolves to an identity, the declared timestamp is inside the skew
//! window, the HMAC signature matches the canonical string
//! `player|nonce|timestamp|body`, and the nonce has never been consumed by
//! that identity. Replay state is only mutated for cryptographically
//! authentic requests.
//!
//! Replay protection is bounded by the nonce retention TTL (default 600
//! seconds): a nonce may be legally reused after it ages out. That is an
//! accepted storage/perfection tradeoff, not a bug.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod service;
pub mod social;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{CredentialIssuer, PlayerProfile, ReplayGuard};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use service::{AuthResponse, BackendService, SignedEnvelope};
pub use social::{FriendGraph, JoinCodeAllocator};
pub use store::{MemoryStore, RecordStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
