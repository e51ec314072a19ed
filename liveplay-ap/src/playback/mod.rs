//! Cue playback, ducking and group sequencing

pub mod actions;
pub mod clock_transport;
pub mod ducking;
pub mod engine;
pub mod levels;
pub mod runtime;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod transport;
pub mod types;

pub use actions::{ActionDispatcher, HttpActionDispatcher, RecordingDispatcher};
pub use clock_transport::ClockTransport;
pub use engine::{CueEngine, TriggerTarget};
pub use runtime::{spawn_engine, EngineHandle, RuntimeOptions};
pub use session::Session;
pub use transport::{Transport, TransportEvent, TransportId};
pub use types::{ActiveCue, ActiveGroup, EngineSnapshot, MasterLevel};
