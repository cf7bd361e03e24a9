//! Authentication Layer
//!
//! The security core: credential issuance and rotation, signed-request
//! verification, and replay protection. Request handling gates in order:
//!
//! 1. bearer credential resolves to an identity ([`issuer`])
//! 2. signed headers validate against that identity ([`signature`])
//! 3. the nonce is admitted exactly once ([`replay`])
//!
//! Business logic runs only after all gates pass.

pub mod issuer;
pub mod replay;
pub mod signature;
pub mod token;

pub use issuer::{CredentialIssuer, IssuedCredential, PlayerProfile};
pub use replay::{expired_nonce_keys, ReplayGuard};
pub use signature::{
    canonical_score, envelope_payload, hmac_b64, join_payload, score_payload,
    verify_hmac_b64, verify_signed_headers, MIN_CLOCK_SKEW_SECS,
};
pub use token::{new_token, token_sha256};
