//! Service Error Taxonomy
//!
//! Every rejection in the backend core carries a distinct reason surfaced to
//! the caller. Authentication failures are terminal for the request that
//! triggered them: the client must re-sign with a fresh nonce and timestamp.
//! Only storage failures and join-code allocation exhaustion are worth
//! retrying after backoff.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the backend core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No bearer credential was presented.
    #[error("missing bearer token")]
    MissingCredential,

    /// The presented bearer credential does not resolve to any identity.
    /// Also returned for credentials invalidated by rotation.
    #[error("invalid token")]
    InvalidCredential,

    /// Nonce, timestamp or signature header is absent, empty or unparseable.
    #[error("missing signed headers")]
    MissingSignedHeaders,

    /// Declared timestamp is outside the tolerated clock-skew window.
    #[error("timestamp out of range")]
    TimestampOutOfRange,

    /// HMAC signature does not match the canonical payload.
    #[error("bad signature")]
    BadSignature,

    /// The (identity, nonce) pair was already consumed within the
    /// retention window.
    #[error("replay detected (nonce reused)")]
    ReplayDetected,

    /// Presented join code does not resolve to any identity.
    #[error("code not found")]
    CodeNotFound,

    /// A player tried to friend themselves.
    #[error("cannot friend self")]
    SelfJoinRejected,

    /// Join-code allocation collided on every attempt.
    #[error("failed to allocate friend code")]
    AllocationExhausted,

    /// Body-level player id differs from the authenticated identity.
    #[error("player mismatch")]
    PlayerMismatch,

    /// Business payload failed validation.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The record store reported a failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ServiceError {
    /// Whether the caller may retry the same logical operation after backoff.
    ///
    /// Authentication rejections are never retriable as-is: the envelope must
    /// be re-signed with a fresh nonce and timestamp.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(_) | ServiceError::AllocationExhausted
        )
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Storage(err.to_string())
    }
}
