//! Playback transport abstraction
//!
//! A transport owns the actual voices (decoded media, output routing). The
//! engine only ever talks to it through handles: load a source, start it,
//! ramp its volume, stop it and release it. End-of-media and failures come
//! back as polled [`TransportEvent`]s so the engine stays single-threaded.

use liveplay_common::levels::max_gain;
use liveplay_common::model::TrimRegion;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// Opaque handle to one loaded voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TransportId(pub u64);

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Everything a transport needs to prepare a voice
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub source: PathBuf,
    /// Initial linear gain, already passed through [`playback_gain`]
    pub volume: f32,
    /// Repeat natively; a looping voice never reports `Ended`
    pub looping: bool,
    /// Sprite window inside the file, `None` plays the whole file
    pub region: Option<TrimRegion>,
    /// Total file length in seconds
    pub file_duration: f64,
}

/// Asynchronous notifications drained by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Voice reached the end of its file or sprite window
    Ended { id: TransportId },

    /// Voice failed after it was loaded (decode error, device loss, ...)
    Failed { id: TransportId, message: String },
}

/// Audio playback backend
///
/// Volume arguments are linear gains. Operations on an unknown handle are
/// ignored, since the engine may release a voice while an event for it is
/// still queued.
pub trait Transport: Send {
    /// Prepare a voice; an `Err` means the media could not be opened
    fn load(&mut self, request: LoadRequest) -> Result<TransportId>;

    /// Start (or resume) a loaded voice
    fn play(&mut self, id: TransportId) -> Result<()>;

    fn pause(&mut self, id: TransportId);

    fn stop(&mut self, id: TransportId);

    /// Release all resources held by the voice
    fn unload(&mut self, id: TransportId);

    /// Jump to a volume, cancelling any running fade
    fn set_volume(&mut self, id: TransportId, volume: f32);

    /// Ramp volume from `from` to `to` over `duration`
    fn fade(&mut self, id: TransportId, from: f32, to: f32, duration: Duration);

    /// Playback position in seconds from the start of the file
    fn position(&self, id: TransportId) -> Option<f64>;

    /// Move clock-driven transports forward to `now`
    fn advance(&mut self, _now: Duration) {}

    fn drain_events(&mut self) -> Vec<TransportEvent>;
}

/// Map a cue volume to the gain handed to a transport
///
/// Volumes pass through unchanged, limited to silence..+10 dB. Non-finite
/// values are treated as silence.
pub fn playback_gain(volume: f32) -> f32 {
    if !volume.is_finite() {
        return 0.0;
    }
    volume.clamp(0.0, max_gain())
}

/// Seconds as a `Duration`, negative and non-finite values become zero
pub fn secs(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds)
    } else {
        Duration::ZERO
    }
}
