//! Sizzle Backend Server
//!
//! Demo driver for the backend core. Exercises the full authenticated flow
//! against the in-memory store: login, signed requests, replay rejection,
//! credential rotation, friend join and leaderboard ranking.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sizzle::auth::{envelope_payload, hmac_b64, join_payload, score_payload};
use sizzle::service::{FriendJoinRequest, ScoreSubmitRequest};
use sizzle::{BackendService, MemoryStore, ServiceConfig, ServiceError, SignedEnvelope, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Sizzle Backend v{}", VERSION);

    let config = ServiceConfig::from_env();
    info!(
        skew = config.max_clock_skew_secs,
        nonce_ttl = config.nonce_ttl_secs,
        "configuration loaded"
    );
    if config.hmac_secret == "CHANGE_ME" {
        warn!("running with the default HMAC secret; set SIZZLE_HMAC_SECRET in production");
    }

    let service = Arc::new(BackendService::new(config, Arc::new(MemoryStore::new())));
    demo_flow(&service).await?;
    Ok(())
}

/// Walk the protocol end to end the way the mobile client does.
async fn demo_flow(service: &Arc<BackendService<MemoryStore>>) -> Result<()> {
    info!("=== Guest Login ===");
    let alice = service.issue_credential("demo-device-alice")?;
    let bob = service.issue_credential("demo-device-bob")?;
    info!("alice: {}", alice.player_id);
    info!("bob:   {}", bob.player_id);

    let secret = service.config().hmac_secret.clone();
    let now = unix_now();

    info!("=== Signed Score Submission ===");
    let score = 4821.7;
    let req = ScoreSubmitRequest {
        player_id: alice.player_id.clone(),
        score,
        signature: hmac_b64(&secret, &score_payload(&alice.player_id, score, now)),
        timestamp: now,
        nonce: "demo-n1".into(),
    };
    let body = serde_json::to_string(&req)?;
    let env = sign_envelope(&secret, &alice.token, &alice.player_id, "demo-n1", now, &body);
    service.submit_score(&env, &req)?;
    info!("score {} accepted", score);

    info!("=== Replay Attempt ===");
    match service.submit_score(&env, &req) {
        Err(ServiceError::ReplayDetected) => info!("replay rejected, as it should be"),
        other => warn!("unexpected outcome: {:?}", other),
    }

    info!("=== Concurrent Nonce Flood ===");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(service);
        let secret = secret.clone();
        let token = bob.token.clone();
        let player = bob.player_id.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let env = sign_envelope(&secret, &token, &player, "contested", unix_now(), "");
            service.verify_envelope(&env).is_ok()
        }));
    }
    let mut admitted = 0;
    for handle in handles {
        if handle.await? {
            admitted += 1;
        }
    }
    info!("{} of 8 concurrent identical nonces admitted", admitted);

    info!("=== Friend Join ===");
    let bob_code = service.allocate_or_get_join_code(&bob.player_id)?;
    info!("bob's join code: {}", bob_code);

    let req = FriendJoinRequest {
        player_id: alice.player_id.clone(),
        code: bob_code.clone(),
        signature: hmac_b64(&secret, &join_payload(&alice.player_id, &bob_code, now)),
        timestamp: now,
        nonce: "demo-n2".into(),
    };
    let body = serde_json::to_string(&req)?;
    let env = sign_envelope(&secret, &alice.token, &alice.player_id, "demo-n2", now, &body);
    service.join_by_code(&env, &req)?;

    let env = sign_envelope(&secret, &alice.token, &alice.player_id, "demo-n3", now, "");
    for friend in service.list_friends(&env)? {
        info!("alice's friend: {} ({})", friend.display_name, friend.player_id);
    }

    info!("=== Leaderboard ===");
    let env = sign_envelope(&secret, &alice.token, &alice.player_id, "demo-n4", now, "");
    for entry in service.leaderboard_top(&env, "KR", 10)? {
        info!("#{}: {} - {}", entry.rank, entry.display_name, entry.score);
    }

    info!("=== Credential Rotation ===");
    let rotated = service.issue_credential("demo-device-alice")?;
    let stale = sign_envelope(&secret, &alice.token, &alice.player_id, "demo-n5", now, "");
    match service.verify_envelope(&stale) {
        Err(ServiceError::InvalidCredential) => info!("old credential invalidated by rotation"),
        other => warn!("unexpected outcome: {:?}", other),
    }
    let fresh = sign_envelope(&secret, &rotated.token, &rotated.player_id, "demo-n6", now, "");
    service.verify_envelope(&fresh)?;
    info!("fresh credential accepted");

    Ok(())
}

/// Build a signed envelope the way the client runtime does.
fn sign_envelope(
    secret: &str,
    token: &str,
    player_id: &str,
    nonce: &str,
    ts: i64,
    body: &str,
) -> SignedEnvelope {
    SignedEnvelope {
        bearer_token: token.to_string(),
        nonce: nonce.to_string(),
        timestamp: ts.to_string(),
        signature: hmac_b64(secret, &envelope_payload(player_id, nonce, ts, body)),
        body: body.to_string(),
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
