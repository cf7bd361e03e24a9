//! Service Configuration
//!
//! All knobs the core reads: the shared signing secret, the credential-hash
//! salt, the clock-skew tolerance and the nonce retention TTL. Configuration
//! is an explicit struct passed to the service at construction so tests can
//! inject distinct values per case without cross-test interference.

/// Default clock-skew tolerance in seconds.
pub const DEFAULT_MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Default nonce retention TTL in seconds.
pub const DEFAULT_NONCE_TTL_SECS: i64 = 600;

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Shared HMAC secret for request signing.
    pub hmac_secret: String,
    /// Salt mixed into bearer-credential hashes so stored hashes are not
    /// directly reversible via rainbow tables.
    pub token_salt: String,
    /// Maximum tolerated difference between a request's declared timestamp
    /// and the server clock, in seconds. A floor of 30 seconds is enforced
    /// at verification time regardless of this value.
    pub max_clock_skew_secs: i64,
    /// How long consumed nonces are retained, in seconds. A nonce may be
    /// legally reused after it ages out of this window.
    pub nonce_ttl_secs: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hmac_secret: "CHANGE_ME".to_string(),
            token_salt: "dev-only-salt".to_string(),
            max_clock_skew_secs: DEFAULT_MAX_CLOCK_SKEW_SECS,
            nonce_ttl_secs: DEFAULT_NONCE_TTL_SECS,
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables.
    ///
    /// Absent or malformed values fall back to the documented defaults; a
    /// misconfigured deployment degrades rather than failing every request.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            hmac_secret: std::env::var("SIZZLE_HMAC_SECRET")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.hmac_secret),
            token_salt: std::env::var("SIZZLE_TOKEN_SALT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.token_salt),
            max_clock_skew_secs: parse_seconds(
                std::env::var("SIZZLE_MAX_CLOCK_SKEW_SECONDS").ok(),
                DEFAULT_MAX_CLOCK_SKEW_SECS,
            ),
            nonce_ttl_secs: parse_seconds(
                std::env::var("SIZZLE_NONCE_TTL_SECONDS").ok(),
                DEFAULT_NONCE_TTL_SECS,
            ),
        }
    }
}

/// Parse a seconds value, falling back to `default` on absence or garbage.
fn parse_seconds(raw: Option<String>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_clock_skew_secs, 300);
        assert_eq!(config.nonce_ttl_secs, 600);
        assert_eq!(config.hmac_secret, "CHANGE_ME");
        assert_eq!(config.token_salt, "dev-only-salt");
    }

    #[test]
    fn test_parse_seconds_valid() {
        assert_eq!(parse_seconds(Some("120".into()), 300), 120);
        assert_eq!(parse_seconds(Some(" 45 ".into()), 300), 45);
    }

    #[test]
    fn test_parse_seconds_fallback() {
        assert_eq!(parse_seconds(None, 300), 300);
        assert_eq!(parse_seconds(Some("".into()), 300), 300);
        assert_eq!(parse_seconds(Some("not-a-number".into()), 300), 300);
        assert_eq!(parse_seconds(Some("12.5".into()), 300), 300);
        // Zero and negative windows are unusable; fall back.
        assert_eq!(parse_seconds(Some("0".into()), 300), 300);
        assert_eq!(parse_seconds(Some("-60".into()), 300), 300);
    }
}
