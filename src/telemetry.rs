//! Telemetry Ingest
//!
//! Gameplay analytics events, accepted only through the authenticated and
//! signed request path like every other body-bearing operation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::store::{keys, RecordStore};

/// Key-value pairs kept per event; the rest are dropped.
pub const MAX_EVENT_KV: usize = 50;

/// Stored analytics event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    /// Reporting identity.
    pub player_id: String,
    /// Event name, non-empty.
    pub event_name: String,
    /// Free-form key-value payload.
    pub kv: Vec<String>,
    /// Client-declared timestamp, unix seconds.
    pub timestamp: i64,
}

/// Event ingest over the shared store.
pub struct Telemetry<S: RecordStore> {
    store: Arc<S>,
}

impl<S: RecordStore> Telemetry<S> {
    /// Create a telemetry sink over the shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record one event for `player_id`.
    ///
    /// The event name must be non-empty; the kv list is truncated to
    /// [`MAX_EVENT_KV`] entries; a zero timestamp defaults to `now`.
    pub fn record(
        &self,
        player_id: &str,
        event_name: &str,
        mut kv: Vec<String>,
        timestamp: i64,
        now: i64,
    ) -> Result<(), ServiceError> {
        let event_name = event_name.trim();
        if event_name.is_empty() {
            return Err(ServiceError::InvalidPayload(
                "missing eventName".to_string(),
            ));
        }
        kv.truncate(MAX_EVENT_KV);

        let event = AnalyticsEvent {
            player_id: player_id.to_string(),
            event_name: event_name.to_string(),
            kv,
            timestamp: if timestamp > 0 { timestamp } else { now },
        };
        let doc = serde_json::to_string(&event)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let key = keys::event(player_id, &Uuid::new_v4().simple().to_string());
        self.store.upsert(&key, &doc)?;
        Ok(())
    }

    /// All events recorded for one player (test and admin visibility).
    pub fn events_for(&self, player_id: &str) -> Result<Vec<AnalyticsEvent>, ServiceError> {
        let prefix = format!("event:{player_id}:");
        self.store
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(_, doc)| {
                serde_json::from_str(&doc).map_err(|e| ServiceError::Storage(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NOW: i64 = 1_700_000_000;

    fn telemetry() -> Telemetry<MemoryStore> {
        Telemetry::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_record_and_read_back() {
        let sink = telemetry();
        sink.record("p1", "session_start", vec!["level=3".into()], NOW, NOW)
            .unwrap();

        let events = sink.events_for("p1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "session_start");
        assert_eq!(events[0].kv, vec!["level=3".to_string()]);
    }

    #[test]
    fn test_empty_name_rejected() {
        let sink = telemetry();
        assert!(matches!(
            sink.record("p1", "  ", vec![], NOW, NOW),
            Err(ServiceError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_kv_truncated() {
        let sink = telemetry();
        let kv: Vec<String> = (0..80).map(|i| format!("k{}", i)).collect();
        sink.record("p1", "spam", kv, NOW, NOW).unwrap();

        assert_eq!(sink.events_for("p1").unwrap()[0].kv.len(), MAX_EVENT_KV);
    }

    #[test]
    fn test_zero_timestamp_defaults_to_now() {
        let sink = telemetry();
        sink.record("p1", "tick", vec![], 0, NOW).unwrap();
        assert_eq!(sink.events_for("p1").unwrap()[0].timestamp, NOW);
    }
}
