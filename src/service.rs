//! Backend Service Facade
//!
//! Wires configuration, the record store and the components into the
//! operations request handlers call. Every protected operation runs the same
//! gate sequence - bearer resolution, signed-header verification, nonce
//! admission - before any business logic executes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::auth::{
    score_payload, join_payload, verify_hmac_b64, verify_signed_headers, CredentialIssuer,
    ReplayGuard,
};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::social::{FriendEntry, FriendGraph, JoinCodeAllocator};
use crate::store::RecordStore;
use crate::telemetry::Telemetry;

/// Issue response handed back to the client at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The player identity.
    pub player_id: String,
    /// Plaintext bearer credential; presented on every subsequent request.
    pub token: String,
}

/// The signed tuple presented with every protected call.
///
/// Transient: exists only for the duration of one request's validation.
/// `body` is the raw request body, empty for body-less operations.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    /// Bearer credential from the authorization header.
    pub bearer_token: String,
    /// Caller-supplied per-request nonce.
    pub nonce: String,
    /// Declared timestamp, decimal unix seconds.
    pub timestamp: String,
    /// Base64 HMAC-SHA256 over the canonical envelope string.
    pub signature: String,
    /// Raw request body.
    pub body: String,
}

/// Score submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmitRequest {
    /// Claimed identity; must match the authenticated one.
    pub player_id: String,
    /// Submitted score.
    pub score: f64,
    /// Body-level signature over `player|score_int|ts`.
    pub signature: String,
    /// Body-level timestamp.
    pub timestamp: i64,
    /// Request nonce (repeated in the body by the client).
    pub nonce: String,
}

/// Friend-invite payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendJoinRequest {
    /// Claimed identity; must match the authenticated one.
    pub player_id: String,
    /// Presented join code.
    pub code: String,
    /// Body-level signature over `player|code|ts`.
    pub signature: String,
    /// Body-level timestamp.
    pub timestamp: i64,
    /// Request nonce.
    pub nonce: String,
}

/// Telemetry payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    /// Claimed identity; must match the authenticated one.
    pub player_id: String,
    /// Event name.
    pub event_name: String,
    /// Key-value payload.
    #[serde(default)]
    pub kv: Vec<String>,
    /// Client timestamp.
    pub timestamp: i64,
    /// Request nonce.
    pub nonce: String,
}

/// The backend core, generic over the record store implementation.
pub struct BackendService<S: RecordStore> {
    config: ServiceConfig,
    issuer: CredentialIssuer<S>,
    replay: ReplayGuard<S>,
    codes: JoinCodeAllocator<S>,
    friends: FriendGraph<S>,
    board: Leaderboard<S>,
    telemetry: Telemetry<S>,
}

impl<S: RecordStore> BackendService<S> {
    /// Assemble the service over a shared store.
    pub fn new(config: ServiceConfig, store: Arc<S>) -> Self {
        Self {
            issuer: CredentialIssuer::new(Arc::clone(&store), config.token_salt.clone()),
            replay: ReplayGuard::new(Arc::clone(&store), config.nonce_ttl_secs),
            codes: JoinCodeAllocator::new(Arc::clone(&store)),
            friends: FriendGraph::new(Arc::clone(&store)),
            board: Leaderboard::new(Arc::clone(&store)),
            telemetry: Telemetry::new(store),
            config,
        }
    }

    /// Guest login: create-or-reuse the identity for a device and mint a
    /// fresh credential, invalidating any previous one. The join code is
    /// ensured eagerly so a new account can immediately share it.
    pub fn issue_credential(&self, device_id: &str) -> Result<AuthResponse, ServiceError> {
        let issued = self.issuer.issue(device_id, self.now())?;
        self.codes.allocate_or_get(&issued.player_id)?;
        info!(player_id = %issued.player_id, "credential issued");
        Ok(AuthResponse {
            player_id: issued.player_id,
            token: issued.token,
        })
    }

    /// Run the full authentication gate sequence for one request.
    ///
    /// Returns the authenticated identity. On success the nonce is consumed:
    /// the same envelope can never validate again within the retention
    /// window.
    pub fn verify_envelope(&self, env: &SignedEnvelope) -> Result<String, ServiceError> {
        let player_id = self.issuer.resolve(&env.bearer_token)?;
        let now = self.now();
        let ts = verify_signed_headers(
            &player_id,
            &env.nonce,
            &env.timestamp,
            &env.signature,
            &env.body,
            &self.config.hmac_secret,
            now,
            self.config.max_clock_skew_secs,
        )?;
        self.replay.admit(&player_id, env.nonce.trim(), ts, now)?;
        debug!(player_id = %player_id, "envelope verified");
        Ok(player_id)
    }

    /// Return the caller's join code, allocating it on first need.
    pub fn allocate_or_get_join_code(&self, player_id: &str) -> Result<String, ServiceError> {
        self.codes.allocate_or_get(player_id)
    }

    /// Friend join by code: authenticated, envelope-signed and body-signed.
    pub fn join_by_code(
        &self,
        env: &SignedEnvelope,
        req: &FriendJoinRequest,
    ) -> Result<(), ServiceError> {
        let player_id = self.verify_envelope(env)?;
        if req.player_id != player_id {
            return Err(ServiceError::PlayerMismatch);
        }

        let payload = join_payload(&player_id, &req.code, req.timestamp);
        if !verify_hmac_b64(&self.config.hmac_secret, &payload, &req.signature) {
            return Err(ServiceError::BadSignature);
        }

        self.friends.join_by_code(&player_id, &req.code, self.now())?;
        info!(player_id = %player_id, "friend join");
        Ok(())
    }

    /// Score submission: authenticated, envelope-signed and body-signed.
    ///
    /// The body signature covers the canonicalized (integer-rounded) score,
    /// so a legitimately signed envelope cannot smuggle a different payload.
    pub fn submit_score(
        &self,
        env: &SignedEnvelope,
        req: &ScoreSubmitRequest,
    ) -> Result<(), ServiceError> {
        let player_id = self.verify_envelope(env)?;
        if req.player_id != player_id {
            return Err(ServiceError::PlayerMismatch);
        }

        let payload = score_payload(&player_id, req.score, req.timestamp);
        if !verify_hmac_b64(&self.config.hmac_secret, &payload, &req.signature) {
            return Err(ServiceError::BadSignature);
        }

        let region = self
            .issuer
            .profile(&player_id)?
            .map(|p| p.region)
            .unwrap_or_else(|| crate::leaderboard::DEFAULT_REGION.to_string());
        self.board
            .submit_best(&player_id, &region, req.score, self.now())?;
        info!(player_id = %player_id, score = req.score, "score submitted");
        Ok(())
    }

    /// Ranked top-N for a region; authenticated and envelope-signed.
    pub fn leaderboard_top(
        &self,
        env: &SignedEnvelope,
        region: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        self.verify_envelope(env)?;
        self.board.top(region, limit)
    }

    /// The caller's friend list; authenticated and envelope-signed.
    pub fn list_friends(&self, env: &SignedEnvelope) -> Result<Vec<FriendEntry>, ServiceError> {
        let player_id = self.verify_envelope(env)?;
        self.friends.list(&player_id)
    }

    /// Telemetry ingest; authenticated and envelope-signed.
    pub fn record_event(
        &self,
        env: &SignedEnvelope,
        req: &EventRequest,
    ) -> Result<(), ServiceError> {
        let player_id = self.verify_envelope(env)?;
        if req.player_id != player_id {
            return Err(ServiceError::PlayerMismatch);
        }
        self.telemetry.record(
            &player_id,
            &req.event_name,
            req.kv.clone(),
            req.timestamp,
            self.now(),
        )
    }

    /// Service configuration (read-only).
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}
