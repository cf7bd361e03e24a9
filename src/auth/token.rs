//! Bearer credential generation and hashing.
//!
//! Credentials are opaque 32-byte secrets, URL-safe so they survive HTTP
//! headers unescaped. Only a salted SHA-256 hash is ever persisted; the
//! plaintext exists in the issue response and nowhere else.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Raw entropy per credential, before encoding.
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh high-entropy bearer credential.
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Salted one-way hash of a bearer credential, hex encoded.
///
/// The salt keeps stored hashes from being reversible via precomputed
/// tables. The `salt:token` layout is a compatibility contract with
/// existing credential rows and must not change.
pub fn token_sha256(token: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let a = new_token();
        let b = new_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_is_header_safe() {
        let token = new_token();
        // 32 bytes of base64 without padding: 43 characters.
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let h1 = token_sha256("tok", "salt");
        let h2 = token_sha256("tok", "salt");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64); // hex of 32 bytes
    }

    #[test]
    fn test_hash_depends_on_salt() {
        assert_ne!(token_sha256("tok", "salt-a"), token_sha256("tok", "salt-b"));
    }

    #[test]
    fn test_hash_never_contains_token() {
        let token = new_token();
        let hash = token_sha256(&token, "salt");
        assert!(!hash.contains(&token));
    }
}
