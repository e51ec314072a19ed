//! # LivePlay Audio Player Library (liveplay-ap)
//!
//! Cue-playback and sequencing engine for live shows.
//!
//! **Purpose:** Track every simultaneously playing cue, duck or stop cues
//! that interact, chain playback through start/end behaviors and custom
//! actions, and follow progress through nested group sequences.
//!
//! **Architecture:** A synchronous `CueEngine` owned by a single tokio task
//! (`playback::runtime`), a pluggable `Transport` for actual playback and an
//! axum HTTP/SSE control surface.

pub mod api;
pub mod config;
pub mod error;
pub mod library;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
