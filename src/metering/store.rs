//! Persistence contract for the conversion event log.
//!
//! Hosts back the ledger with any durable store by implementing
//! [`EventStore`]. The store never updates or deletes events.

use crate::metering::event::ConversionEvent;
use crate::metering::plan::AccountId;
use chrono::{DateTime, Utc};
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A concurrent writer won; the whole request may be retried
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub trait EventStore: Send + Sync {
    /// Append one event to the log
    fn append(&self, event: ConversionEvent) -> Result<(), StoreError>;

    /// Events for `account` with a timestamp at or after `since`, oldest first
    fn query_by_account_since(
        &self,
        account: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConversionEvent>, StoreError>;
}

/// In-process event log
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<ConversionEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events across all accounts
    pub fn len(&self) -> Result<usize, StoreError> {
        self.events
            .read()
            .map(|events| events.len())
            .map_err(|_| poisoned())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl EventStore for MemoryEventStore {
    fn append(&self, event: ConversionEvent) -> Result<(), StoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| poisoned())?;
        events.push(event);
        Ok(())
    }

    fn query_by_account_since(
        &self,
        account: &AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConversionEvent>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| poisoned())?;
        Ok(events
            .iter()
            .filter(|e| e.account() == account && e.timestamp() >= since)
            .cloned()
            .collect())
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("event log lock poisoned".to_string())
}
