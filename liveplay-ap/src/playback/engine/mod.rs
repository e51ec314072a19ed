//! Cue engine
//!
//! **Module Structure:**
//! - `core.rs`: engine state, clock, cue lifecycle (play, stop, pause, panic)
//! - `chaining.rs`: triggers, groups, start/end behaviors, custom actions
//! - `diagnostics.rs`: snapshots, meters, event outbox
//!
//! The engine is synchronous and single-writer: every mutation happens in a
//! call on `&mut CueEngine`, and time only moves through [`CueEngine::tick`].

mod chaining;
mod core;
mod diagnostics;

pub use self::chaining::TriggerTarget;
pub use self::core::{CueEngine, PANIC_FADE, POLL_INTERVAL};
