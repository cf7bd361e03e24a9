//! Record Store
//!
//! The backend's only shared mutable state lives behind this module: the
//! credential-hash mapping, the consumed-nonce set, the join-code allocation
//! set, the friend-edge set and the leaderboard rows. The core never caches
//! any of it in process memory across requests.
//!
//! `RecordStore` is the collaborator seam: a deployment backs it with a real
//! database, tests and the demo binary use [`MemoryStore`]. The important
//! contract is `insert_if_absent` - a single atomic conditional write, the
//! systems equivalent of a unique-constraint violation. Every security
//! invariant (nonce uniqueness, credential single-validity, code uniqueness)
//! is serialized through it rather than through check-then-insert sequences.

pub mod keys;
pub mod memory;
pub mod record;

pub use memory::MemoryStore;
pub use record::{RecordStore, StoreError};
