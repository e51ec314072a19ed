//! Clock-driven virtual transport
//!
//! Voices produce no sound; their position is derived from the engine
//! clock passed to [`Transport::advance`]. Used by `--dry-run` and by the
//! test suite, where a cloned handle acts as a probe into voice state.

use liveplay_common::model::TrimRegion;
use liveplay_common::FadeCurve;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use super::transport::{LoadRequest, Transport, TransportEvent, TransportId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
enum VoiceState {
    Loaded,
    /// `offset` seconds were already played before `since`
    Playing { since: Duration, offset: f64 },
    Paused { offset: f64 },
    Finished,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct Ramp {
    from: f32,
    to: f32,
    start: Duration,
    duration: Duration,
}

#[derive(Debug, Clone)]
struct Voice {
    source: PathBuf,
    region: TrimRegion,
    looping: bool,
    state: VoiceState,
    volume: f32,
    ramp: Option<Ramp>,
}

impl Voice {
    fn length(&self) -> f64 {
        self.region.length()
    }

    /// Seconds played inside the region (unbounded for looping voices)
    fn elapsed(&self, now: Duration) -> f64 {
        match self.state {
            VoiceState::Loaded | VoiceState::Stopped => 0.0,
            VoiceState::Playing { since, offset } => {
                offset + now.saturating_sub(since).as_secs_f64()
            }
            VoiceState::Paused { offset } => offset,
            VoiceState::Finished => self.length(),
        }
    }

    fn position(&self, now: Duration) -> f64 {
        let elapsed = self.elapsed(now);
        let length = self.length();
        let within = if self.looping && length > 0.0 {
            elapsed % length
        } else {
            elapsed.min(length)
        };
        self.region.start + within
    }

    fn volume_at(&self, now: Duration, curve: FadeCurve) -> f32 {
        match self.ramp {
            Some(ramp) if !ramp.duration.is_zero() => {
                let t = now.saturating_sub(ramp.start).as_secs_f32() / ramp.duration.as_secs_f32();
                curve.ramp(ramp.from, ramp.to, t)
            }
            Some(ramp) => ramp.to,
            None => self.volume,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    now: Duration,
    curve: FadeCurve,
    next_id: u64,
    voices: BTreeMap<TransportId, Voice>,
    events: VecDeque<TransportEvent>,
    fail_next_load: Option<String>,
    fail_next_play: Option<String>,
    /// Every source ever loaded, in order
    load_log: Vec<PathBuf>,
    /// Actual media lengths that override the item metadata
    media_lengths: HashMap<PathBuf, f64>,
}

impl Inner {
    fn settle_ramps(&mut self) {
        let now = self.now;
        let curve = self.curve;
        for voice in self.voices.values_mut() {
            if let Some(ramp) = voice.ramp {
                if now >= ramp.start + ramp.duration {
                    voice.volume = ramp.to;
                    voice.ramp = None;
                } else {
                    voice.volume = voice.volume_at(now, curve);
                }
            }
        }
    }

    fn finish_voices(&mut self) {
        let now = self.now;
        for (id, voice) in self.voices.iter_mut() {
            if voice.looping {
                continue;
            }
            if let VoiceState::Playing { .. } = voice.state {
                if voice.elapsed(now) >= voice.length() {
                    voice.state = VoiceState::Finished;
                    debug!("{} reached end of {}", id, voice.source.display());
                    self.events.push_back(TransportEvent::Ended { id: *id });
                }
            }
        }
    }
}

/// Virtual transport advanced by the engine clock
///
/// Cloning yields another handle onto the same voices.
#[derive(Debug, Clone, Default)]
pub struct ClockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl ClockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `curve` for volume ramps instead of linear
    pub fn with_curve(curve: FadeCurve) -> Self {
        let transport = Self::default();
        transport.lock().curve = curve;
        transport
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Treat `source` as `seconds` long whatever its item metadata says
    pub fn set_media_length(&self, source: impl Into<PathBuf>, seconds: f64) {
        self.lock().media_lengths.insert(source.into(), seconds);
    }

    /// Make the next `load` fail with `message`
    pub fn fail_next_load(&self, message: impl Into<String>) {
        self.lock().fail_next_load = Some(message.into());
    }

    /// Make the next `play` fail with `message`
    pub fn fail_next_play(&self, message: impl Into<String>) {
        self.lock().fail_next_play = Some(message.into());
    }

    /// Break a voice mid-playback; reported on the next drain
    pub fn inject_failure(&self, id: TransportId, message: impl Into<String>) {
        let mut inner = self.lock();
        if let Some(voice) = inner.voices.get_mut(&id) {
            voice.state = VoiceState::Stopped;
            inner.events.push_back(TransportEvent::Failed {
                id,
                message: message.into(),
            });
        }
    }

    /// Current (possibly mid-ramp) gain of a voice
    pub fn volume(&self, id: TransportId) -> Option<f32> {
        let inner = self.lock();
        let curve = inner.curve;
        inner.voices.get(&id).map(|v| v.volume_at(inner.now, curve))
    }

    /// Target of the running ramp, or the steady volume
    pub fn target_volume(&self, id: TransportId) -> Option<f32> {
        let inner = self.lock();
        inner
            .voices
            .get(&id)
            .map(|v| v.ramp.map(|r| r.to).unwrap_or(v.volume))
    }

    pub fn is_fading(&self, id: TransportId) -> bool {
        self.lock()
            .voices
            .get(&id)
            .map(|v| v.ramp.is_some())
            .unwrap_or(false)
    }

    pub fn is_playing(&self, id: TransportId) -> bool {
        matches!(
            self.lock().voices.get(&id).map(|v| v.state),
            Some(VoiceState::Playing { .. })
        )
    }

    pub fn is_paused(&self, id: TransportId) -> bool {
        matches!(
            self.lock().voices.get(&id).map(|v| v.state),
            Some(VoiceState::Paused { .. })
        )
    }

    /// Loaded (not yet unloaded) voices
    pub fn voice_count(&self) -> usize {
        self.lock().voices.len()
    }

    /// Voices currently playing
    pub fn playing_count(&self) -> usize {
        self.lock()
            .voices
            .values()
            .filter(|v| matches!(v.state, VoiceState::Playing { .. }))
            .count()
    }

    /// Handle of the most recently loaded voice for `source`
    pub fn voice_for(&self, source: &std::path::Path) -> Option<TransportId> {
        self.lock()
            .voices
            .iter()
            .rev()
            .find(|(_, v)| v.source == source)
            .map(|(id, _)| *id)
    }

    pub fn load_log(&self) -> Vec<PathBuf> {
        self.lock().load_log.clone()
    }
}

impl Transport for ClockTransport {
    fn load(&mut self, request: LoadRequest) -> Result<TransportId> {
        let mut inner = self.lock();
        inner.load_log.push(request.source.clone());
        if let Some(message) = inner.fail_next_load.take() {
            return Err(Error::Transport(format!(
                "{}: {}",
                request.source.display(),
                message
            )));
        }

        inner.next_id += 1;
        let id = TransportId(inner.next_id);
        let file_length = inner
            .media_lengths
            .get(&request.source)
            .copied()
            .unwrap_or(request.file_duration);
        let region = request.region.unwrap_or(TrimRegion {
            start: 0.0,
            end: file_length.max(0.0),
        });
        inner.voices.insert(
            id,
            Voice {
                source: request.source,
                region,
                looping: request.looping,
                state: VoiceState::Loaded,
                volume: request.volume,
                ramp: None,
            },
        );
        Ok(id)
    }

    fn play(&mut self, id: TransportId) -> Result<()> {
        let mut inner = self.lock();
        if let Some(message) = inner.fail_next_play.take() {
            return Err(Error::Transport(message));
        }
        let now = inner.now;
        let Some(voice) = inner.voices.get_mut(&id) else {
            return Err(Error::Transport(format!("{} is not loaded", id)));
        };
        voice.state = match voice.state {
            VoiceState::Paused { offset } => VoiceState::Playing { since: now, offset },
            VoiceState::Playing { since, offset } => VoiceState::Playing { since, offset },
            _ => VoiceState::Playing {
                since: now,
                offset: 0.0,
            },
        };
        Ok(())
    }

    fn pause(&mut self, id: TransportId) {
        let mut inner = self.lock();
        let now = inner.now;
        if let Some(voice) = inner.voices.get_mut(&id) {
            if let VoiceState::Playing { .. } = voice.state {
                voice.state = VoiceState::Paused {
                    offset: voice.elapsed(now),
                };
            }
        }
    }

    fn stop(&mut self, id: TransportId) {
        if let Some(voice) = self.lock().voices.get_mut(&id) {
            voice.state = VoiceState::Stopped;
        }
    }

    fn unload(&mut self, id: TransportId) {
        self.lock().voices.remove(&id);
    }

    fn set_volume(&mut self, id: TransportId, volume: f32) {
        if let Some(voice) = self.lock().voices.get_mut(&id) {
            voice.volume = volume;
            voice.ramp = None;
        }
    }

    fn fade(&mut self, id: TransportId, from: f32, to: f32, duration: Duration) {
        let mut inner = self.lock();
        let now = inner.now;
        if let Some(voice) = inner.voices.get_mut(&id) {
            if duration.is_zero() {
                voice.volume = to;
                voice.ramp = None;
            } else {
                voice.volume = from;
                voice.ramp = Some(Ramp {
                    from,
                    to,
                    start: now,
                    duration,
                });
            }
        }
    }

    fn position(&self, id: TransportId) -> Option<f64> {
        let inner = self.lock();
        inner.voices.get(&id).map(|v| v.position(inner.now))
    }

    fn advance(&mut self, now: Duration) {
        let mut inner = self.lock();
        if now > inner.now {
            inner.now = now;
        }
        inner.settle_ramps();
        inner.finish_voices();
    }

    fn drain_events(&mut self) -> Vec<TransportEvent> {
        self.lock().events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(region: Option<TrimRegion>, looping: bool) -> LoadRequest {
        LoadRequest {
            source: PathBuf::from("/show/media/bell.wav"),
            volume: 1.0,
            looping,
            region,
            file_duration: 10.0,
        }
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_voice_ends_after_region() {
        let mut transport = ClockTransport::new();
        let region = TrimRegion { start: 2.0, end: 5.0 };
        let id = transport.load(request(Some(region), false)).unwrap();
        transport.play(id).unwrap();

        transport.advance(ms(1500));
        assert!((transport.position(id).unwrap() - 3.5).abs() < 1e-9);
        assert!(transport.drain_events().is_empty());

        transport.advance(ms(3000));
        assert_eq!(transport.drain_events(), vec![TransportEvent::Ended { id }]);
        assert_eq!(transport.position(id), Some(5.0));
        assert!(!transport.is_playing(id));
    }

    #[test]
    fn test_looping_voice_wraps_and_never_ends() {
        let mut transport = ClockTransport::new();
        let id = transport.load(request(None, true)).unwrap();
        transport.play(id).unwrap();

        transport.advance(ms(12_500));
        assert!((transport.position(id).unwrap() - 2.5).abs() < 1e-9);
        assert!(transport.drain_events().is_empty());
    }

    #[test]
    fn test_pause_freezes_position() {
        let mut transport = ClockTransport::new();
        let id = transport.load(request(None, false)).unwrap();
        transport.play(id).unwrap();
        transport.advance(ms(1000));
        transport.pause(id);
        transport.advance(ms(4000));
        assert!((transport.position(id).unwrap() - 1.0).abs() < 1e-9);

        transport.play(id).unwrap();
        transport.advance(ms(5000));
        assert!((transport.position(id).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fade_reaches_target() {
        let mut transport = ClockTransport::new();
        let id = transport.load(request(None, false)).unwrap();
        transport.fade(id, 1.0, 0.0, ms(500));
        transport.advance(ms(250));
        assert!((transport.volume(id).unwrap() - 0.5).abs() < 1e-5);
        assert!(transport.is_fading(id));

        transport.advance(ms(500));
        assert_eq!(transport.volume(id), Some(0.0));
        assert!(!transport.is_fading(id));
    }

    #[test]
    fn test_failure_injection() {
        let mut transport = ClockTransport::new();
        transport.fail_next_load("no such file");
        assert!(transport.load(request(None, false)).is_err());
        assert_eq!(transport.load_log().len(), 1);

        let id = transport.load(request(None, false)).unwrap();
        transport.fail_next_play("device busy");
        assert!(transport.play(id).is_err());

        transport.play(id).unwrap();
        transport.inject_failure(id, "decode error");
        match transport.drain_events().as_slice() {
            [TransportEvent::Failed { id: failed, .. }] => assert_eq!(*failed, id),
            other => panic!("unexpected events {:?}", other),
        }
    }
}
