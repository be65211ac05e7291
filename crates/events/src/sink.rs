//! Event sinks - where a vault publishes its audit records

use crate::error::EventError;
use crate::event::VaultEvent;
use crate::store::EventStore;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Trait for audit event sinks
///
/// A vault publishes each event only after the state change it describes has
/// committed. Sinks must not call back into the vault.
pub trait EventSink: Send + Sync {
    /// Get the sink name (for logging)
    fn name(&self) -> &str;

    /// Record a vault event
    fn publish(&self, event: &VaultEvent) -> Result<(), EventError>;
}

/// Sink that drops every event
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn publish(&self, _event: &VaultEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// In-memory sink, keeps every event in publication order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<VaultEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded events
    pub fn events(&self) -> Vec<VaultEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<VaultEvent>> {
        // A push either happened or it didn't, so a poisoned list is still whole
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn publish(&self, event: &VaultEvent) -> Result<(), EventError> {
        self.lock().push(event.clone());
        Ok(())
    }
}

/// Sink backed by the JSONL journal
pub struct JournalSink {
    store: Mutex<EventStore>,
}

impl JournalSink {
    /// Open (or create) a journal directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventError> {
        Ok(Self::new(EventStore::new(path)?))
    }

    pub fn new(store: EventStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

impl EventSink for JournalSink {
    fn name(&self) -> &str {
        "journal"
    }

    fn publish(&self, event: &VaultEvent) -> Result<(), EventError> {
        let mut store = self.store.lock().map_err(|_| EventError::Poisoned)?;
        store.append(event)
    }
}
