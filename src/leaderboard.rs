//! Leaderboard
//!
//! Best-score-per-player rankings, partitioned by region. Submission keeps
//! the maximum of the stored and submitted score, so a sequence of
//! submissions never lowers a player's standing. The read-modify-write is
//! not atomic across the store's calls: overlapping submissions for the
//! same player can settle on the later write's value, matching the
//! last-writer-wins row update of the original persistence layer.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::auth::PlayerProfile;
use crate::error::ServiceError;
use crate::store::{keys, RecordStore};

/// Region used when the caller supplies none.
pub const DEFAULT_REGION: &str = "KR";

/// Upper bound on a top-N query.
pub const MAX_TOP_LIMIT: usize = 100;

/// One ranked leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Player identity.
    pub player_id: String,
    /// Player display label.
    pub display_name: String,
    /// Best recorded score.
    pub score: f64,
    /// 1-based rank within the queried region.
    pub rank: usize,
}

/// Stored score document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScoreRow {
    score: f64,
    updated_at: i64,
}

/// Leaderboard operations over the shared store.
pub struct Leaderboard<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> Leaderboard<S> {
    /// Create a leaderboard over the shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record `score` for the player, keeping the best of old and new.
    pub fn submit_best(
        &self,
        player_id: &str,
        region: &str,
        score: f64,
        now: i64,
    ) -> Result<(), ServiceError> {
        let region = normalize_region(region);
        let key = keys::score(&region, player_id);

        let best = match self.store.get(&key)? {
            Some(doc) => {
                let row: ScoreRow = serde_json::from_str(&doc)
                    .map_err(|e| ServiceError::Storage(e.to_string()))?;
                row.score.max(score)
            }
            None => score,
        };

        let doc = serde_json::to_string(&ScoreRow {
            score: best,
            updated_at: now,
        })
        .map_err(|e| ServiceError::Storage(e.to_string()))?;
        self.store.upsert(&key, &doc)?;
        Ok(())
    }

    /// Top `limit` players in a region, best score first.
    ///
    /// `limit` is clamped to `1..=`[`MAX_TOP_LIMIT`]; entries whose profile
    /// has vanished are skipped rather than failing the query.
    pub fn top(&self, region: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let region = normalize_region(region);
        let limit = limit.clamp(1, MAX_TOP_LIMIT);
        let prefix = keys::score_prefix(&region);

        let mut rows: Vec<(String, f64)> = Vec::new();
        for (key, doc) in self.store.scan_prefix(&prefix)? {
            let row: ScoreRow = serde_json::from_str(&doc)
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
            rows.push((key[prefix.len()..].to_string(), row.score));
        }
        rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut entries = Vec::new();
        for (player_id, score) in rows {
            if entries.len() == limit {
                break;
            }
            let Some(doc) = self.store.get(&keys::player(&player_id))? else {
                continue;
            };
            let profile: PlayerProfile = serde_json::from_str(&doc)
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
            entries.push(LeaderboardEntry {
                player_id,
                display_name: profile.display_name,
                score,
                rank: entries.len() + 1,
            });
        }
        Ok(entries)
    }
}

/// Trim, uppercase, and default the region partition key.
fn normalize_region(region: &str) -> String {
    let region = region.trim();
    if region.is_empty() {
        DEFAULT_REGION.to_string()
    } else {
        region.to_uppercase()
    }
}
