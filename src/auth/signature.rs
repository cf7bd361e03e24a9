//! Request Signing and Verification
//!
//! The heart of the protocol. Every protected call carries a nonce, a decimal
//! unix timestamp and a base64 HMAC-SHA256 signature over the pipe-delimited
//! canonical string `player|nonce|timestamp|body`. The exact field order and
//! separator are a bit-exact compatibility contract with shipped clients.
//!
//! Check ordering is deliberate: presence, then the clock-skew window, then
//! the signature, and only afterwards the replay guard. Cheap checks run
//! first, and replay state is only mutated for cryptographically authentic
//! requests, so an attacker flooding garbage signatures cannot grow the
//! nonce table.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Hard floor on the clock-skew window, in seconds.
///
/// Enforced even when configuration supplies a smaller value, so a
/// misconfigured deployment can never tighten the window below a usable
/// minimum.
pub const MIN_CLOCK_SKEW_SECS: i64 = 30;

/// Base64-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn hmac_b64(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Constant-time check of a base64 HMAC-SHA256 signature.
///
/// Timing must not leak how many signature bytes were correct, so the
/// comparison goes through the MAC's own verifier rather than `==` on
/// strings. Undecodable base64 is a plain mismatch.
pub fn verify_hmac_b64(secret: &str, payload: &str, signature: &str) -> bool {
    let Ok(sig_bytes) = STANDARD.decode(signature) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    mac.verify_slice(&sig_bytes).is_ok()
}

/// Canonical string for the envelope signature: `player|nonce|ts|body`.
///
/// `body` is the raw request body, empty string when there is none.
pub fn envelope_payload(player_id: &str, nonce: &str, timestamp: i64, body: &str) -> String {
    format!("{player_id}|{nonce}|{timestamp}|{body}")
}

/// Canonical string for the score body signature: `player|score_int|ts`.
pub fn score_payload(player_id: &str, score: f64, timestamp: i64) -> String {
    format!("{player_id}|{}|{timestamp}", canonical_score(score))
}

/// Canonical string for the friend-invite body signature: `player|code|ts`.
pub fn join_payload(player_id: &str, code: &str, timestamp: i64) -> String {
    format!("{player_id}|{code}|{timestamp}")
}

/// Round a score to the integer the clients sign.
///
/// Ties round to even, matching the client runtimes' default rounding;
/// signing the float directly would break on cross-platform formatting.
pub fn canonical_score(score: f64) -> i64 {
    score.round_ties_even() as i64
}

/// Validate the signed headers of one request.
///
/// Returns the parsed timestamp on acceptance so the caller can hand the
/// (identity, nonce, timestamp) tuple to the replay guard - which this
/// function deliberately does not touch.
///
/// `max_skew_secs` comes from configuration; a window narrower than
/// [`MIN_CLOCK_SKEW_SECS`] is widened to the floor. Boundary equality is
/// accepted.
pub fn verify_signed_headers(
    player_id: &str,
    nonce: &str,
    timestamp: &str,
    signature: &str,
    body: &str,
    secret: &str,
    now: i64,
    max_skew_secs: i64,
) -> Result<i64, ServiceError> {
    let nonce = nonce.trim();
    let timestamp = timestamp.trim();
    let signature = signature.trim();
    if nonce.is_empty() || timestamp.is_empty() || signature.is_empty() {
        return Err(ServiceError::MissingSignedHeaders);
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| ServiceError::MissingSignedHeaders)?;

    let window = max_skew_secs.max(MIN_CLOCK_SKEW_SECS);
    if (now - ts).abs() > window {
        return Err(ServiceError::TimestampOutOfRange);
    }

    let payload = envelope_payload(player_id, nonce, ts, body);
    if !verify_hmac_b64(secret, &payload, signature) {
        return Err(ServiceError::BadSignature);
    }

    Ok(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "s";
    const NOW: i64 = 1_700_000_000;

    fn signed(player: &str, nonce: &str, ts: i64, body: &str) -> String {
        hmac_b64(SECRET, &envelope_payload(player, nonce, ts, body))
    }

    #[test]
    fn test_round_trip_accepts() {
        let sig = signed("p1", "n1", NOW, "{\"x\":1}");
        let ts = verify_signed_headers(
            "p1", "n1", &NOW.to_string(), &sig, "{\"x\":1}", SECRET, NOW, 300,
        )
        .unwrap();
        assert_eq!(ts, NOW);
    }

    #[test]
    fn test_empty_body_round_trip() {
        let sig = signed("p1", "n1", NOW, "");
        assert!(verify_signed_headers("p1", "n1", &NOW.to_string(), &sig, "", SECRET, NOW, 300).is_ok());
    }

    #[test]
    fn test_single_field_mutation_flips_result() {
        let sig = signed("p1", "n1", NOW, "body");
        let ts = NOW.to_string();

        // Baseline accepts.
        assert!(verify_signed_headers("p1", "n1", &ts, &sig, "body", SECRET, NOW, 300).is_ok());

        // Mutated nonce.
        assert_eq!(
            verify_signed_headers("p1", "n2", &ts, &sig, "body", SECRET, NOW, 300),
            Err(ServiceError::BadSignature)
        );
        // Mutated timestamp (still inside the window).
        assert_eq!(
            verify_signed_headers("p1", "n1", &(NOW + 1).to_string(), &sig, "body", SECRET, NOW, 300),
            Err(ServiceError::BadSignature)
        );
        // Mutated body.
        assert_eq!(
            verify_signed_headers("p1", "n1", &ts, &sig, "bodY", SECRET, NOW, 300),
            Err(ServiceError::BadSignature)
        );
        // Wrong secret on the verifier side.
        assert_eq!(
            verify_signed_headers("p1", "n1", &ts, &sig, "body", "other", NOW, 300),
            Err(ServiceError::BadSignature)
        );
    }

    #[test]
    fn test_missing_headers_rejected() {
        let sig = signed("p1", "n1", NOW, "");
        let ts = NOW.to_string();
        for (nonce, timestamp, signature) in [
            ("", ts.as_str(), sig.as_str()),
            ("n1", "", sig.as_str()),
            ("n1", ts.as_str(), ""),
            ("  ", ts.as_str(), sig.as_str()),
        ] {
            assert_eq!(
                verify_signed_headers("p1", nonce, timestamp, signature, "", SECRET, NOW, 300),
                Err(ServiceError::MissingSignedHeaders)
            );
        }
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        let sig = signed("p1", "n1", NOW, "");
        assert_eq!(
            verify_signed_headers("p1", "n1", "soon", &sig, "", SECRET, NOW, 300),
            Err(ServiceError::MissingSignedHeaders)
        );
    }

    #[test]
    fn test_skew_boundary_is_inclusive() {
        let skew = 300;
        for delta in [skew, -skew] {
            let ts = NOW + delta;
            let sig = signed("p1", "n1", ts, "");
            // Exactly at the boundary: accepted.
            assert!(
                verify_signed_headers("p1", "n1", &ts.to_string(), &sig, "", SECRET, NOW, skew)
                    .is_ok()
            );
        }
        for delta in [skew + 1, -(skew + 1)] {
            let ts = NOW + delta;
            let sig = signed("p1", "n1", ts, "");
            // One past the boundary: rejected regardless of signature validity.
            assert_eq!(
                verify_signed_headers("p1", "n1", &ts.to_string(), &sig, "", SECRET, NOW, skew),
                Err(ServiceError::TimestampOutOfRange)
            );
        }
    }

    #[test]
    fn test_skew_floor_of_30_seconds() {
        // Configuration tries to tighten the window to 5 seconds; the floor
        // keeps a 30-second-old request valid.
        let ts = NOW - 30;
        let sig = signed("p1", "n1", ts, "");
        assert!(
            verify_signed_headers("p1", "n1", &ts.to_string(), &sig, "", SECRET, NOW, 5).is_ok()
        );

        let ts = NOW - 31;
        let sig = signed("p1", "n1", ts, "");
        assert_eq!(
            verify_signed_headers("p1", "n1", &ts.to_string(), &sig, "", SECRET, NOW, 5),
            Err(ServiceError::TimestampOutOfRange)
        );
    }

    #[test]
    fn test_undecodable_signature_rejected() {
        assert_eq!(
            verify_signed_headers(
                "p1", "n1", &NOW.to_string(), "%%not-base64%%", "", SECRET, NOW, 300
            ),
            Err(ServiceError::BadSignature)
        );
    }

    #[test]
    fn test_canonical_score_rounding() {
        assert_eq!(canonical_score(99.6), 100);
        assert_eq!(canonical_score(99.4), 99);
        assert_eq!(canonical_score(0.0), 0);
        // Ties go to even, matching the client runtimes.
        assert_eq!(canonical_score(2.5), 2);
        assert_eq!(canonical_score(3.5), 4);
    }

    #[test]
    fn test_body_signature_payloads() {
        assert_eq!(score_payload("p1", 1234.6, 42), "p1|1235|42");
        assert_eq!(join_payload("p1", "ABC234", 42), "p1|ABC234|42");
        assert_eq!(envelope_payload("p1", "n1", 42, ""), "p1|n1|42|");
    }
}
