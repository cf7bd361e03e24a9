//! Social Graph
//!
//! Join codes and the friend graph built on them.

pub mod code;
pub mod friends;

pub use code::{JoinCodeAllocator, CODE_ALPHABET, CODE_LENGTH, MAX_ALLOCATION_ATTEMPTS};
pub use friends::{FriendEntry, FriendGraph, FRIEND_LIST_LIMIT};
