//! Shared state between the engine task and the HTTP surface
//!
//! The engine task is the only writer: after every command or tick it
//! publishes a fresh [`EngineSnapshot`] here and forwards engine events to
//! the [`EventBus`]. Handlers only read.

use liveplay_common::events::{EventBus, LiveplayEvent};
use tokio::sync::{broadcast, RwLock};

use crate::playback::types::EngineSnapshot;

/// Default event buffer for SSE clients
pub const EVENT_BUFFER: usize = 256;

/// Shared state accessible by all components
pub struct SharedState {
    /// Latest published engine snapshot
    pub snapshot: RwLock<EngineSnapshot>,

    /// Event broadcaster for SSE listeners
    pub events: EventBus,
}

impl SharedState {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUFFER)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshot: RwLock::new(EngineSnapshot::default()),
            events: EventBus::new(capacity),
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: LiveplayEvent) {
        // No receivers is fine
        self.events.emit_lossy(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<LiveplayEvent> {
        self.events.subscribe()
    }

    pub async fn get_snapshot(&self) -> EngineSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn set_snapshot(&self, snapshot: EngineSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
