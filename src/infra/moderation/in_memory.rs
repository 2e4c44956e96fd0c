// In-memory moderation log.
//
// Used when no database path is configured, and in tests. Events are lost
// on restart.

use crate::core::moderation::{LogStoreError, ModerationEvent, ModerationLogStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Oldest events are dropped once the log grows past this.
const MAX_EVENTS: usize = 10_000;

/// DashMap keyed by an insertion sequence number, so "newest first" is just
/// a descending sort on the key.
pub struct InMemoryModerationLog {
    events: DashMap<u64, ModerationEvent>,
    next_id: AtomicU64,
}

impl InMemoryModerationLog {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryModerationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModerationLogStore for InMemoryModerationLog {
    async fn record_event(&self, event: ModerationEvent) -> Result<(), LogStoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.events.insert(id, event);

        // Ids are sequential, so each insert past the cap evicts exactly one.
        if let Some(expired) = id.checked_sub(MAX_EVENTS as u64) {
            self.events.remove(&expired);
        }

        Ok(())
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<ModerationEvent>, LogStoreError> {
        let mut events: Vec<(u64, ModerationEvent)> = self
            .events
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        events.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        Ok(events
            .into_iter()
            .take(limit)
            .map(|(_, event)| event)
            .collect())
    }
}
