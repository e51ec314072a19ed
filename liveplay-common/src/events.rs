//! Event types for the LivePlay event system
//!
//! Provides the shared event definitions and the EventBus used to fan
//! engine notifications out to SSE clients and other listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// LivePlay event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveplayEvent {
    /// A cue started sounding
    CueStarted {
        uuid: Uuid,
        display_name: String,
        /// Effective (trimmed) duration in seconds
        duration: f64,
        timestamp: DateTime<Utc>,
    },

    /// A cue left the active set
    CueEnded {
        uuid: Uuid,
        /// `true` on natural end, `false` when stopped
        completed: bool,
        timestamp: DateTime<Utc>,
    },

    /// A cue could not start or its transport failed while playing
    CueFailed {
        uuid: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A cue was lowered by a ducking cue
    CueDucked {
        uuid: Uuid,
        ducked_by: Uuid,
        volume: f32,
        timestamp: DateTime<Utc>,
    },

    /// Last ducker ended; the cue fades back to its original volume
    CueRestored {
        uuid: Uuid,
        volume: f32,
        timestamp: DateTime<Utc>,
    },

    /// A play-first group began chain tracking
    GroupTrackingStarted {
        uuid: Uuid,
        display_name: String,
        total_duration: f64,
        chain: Vec<Uuid>,
        timestamp: DateTime<Utc>,
    },

    /// Position through a tracked group chain
    GroupProgress {
        uuid: Uuid,
        current_time: f64,
        total_duration: f64,
        current_item_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// Group chain tracking ended
    GroupTrackingEnded {
        uuid: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Emergency fade of everything started
    PanicStarted { timestamp: DateTime<Utc> },

    /// Periodic debug dump of the active-cue and active-group maps
    StateSnapshot {
        state: serde_json::Value,
        timestamp: DateTime<Utc>,
    },
}

impl LiveplayEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            LiveplayEvent::CueStarted { .. } => "CueStarted",
            LiveplayEvent::CueEnded { .. } => "CueEnded",
            LiveplayEvent::CueFailed { .. } => "CueFailed",
            LiveplayEvent::CueDucked { .. } => "CueDucked",
            LiveplayEvent::CueRestored { .. } => "CueRestored",
            LiveplayEvent::GroupTrackingStarted { .. } => "GroupTrackingStarted",
            LiveplayEvent::GroupProgress { .. } => "GroupProgress",
            LiveplayEvent::GroupTrackingEnded { .. } => "GroupTrackingEnded",
            LiveplayEvent::PanicStarted { .. } => "PanicStarted",
            LiveplayEvent::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}

/// One-to-many event broadcaster
///
/// Thin wrapper over `tokio::sync::broadcast`; slow receivers lag and
/// lose the oldest events rather than blocking the engine.
pub struct EventBus {
    tx: broadcast::Sender<LiveplayEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events
    ///
    /// # Examples
    ///
    /// ```
    /// use liveplay_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(1000);
    /// assert_eq!(event_bus.capacity(), 1000);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LiveplayEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; `Err` when nobody is listening
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LiveplayEvent,
    ) -> Result<usize, broadcast::error::SendError<LiveplayEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LiveplayEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
