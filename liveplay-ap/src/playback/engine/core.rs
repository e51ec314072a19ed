//! Core cue engine - state, clock and cue lifecycle
//!
//! **Responsibilities:**
//! - `CueEngine` definition and construction
//! - Clock: `tick` advances the transport, handles transport events and
//!   runs due timers
//! - Cue lifecycle: play, natural end, stop, stop-all, panic, pause/resume
//! - Progress polling and the end-of-window safety net

use chrono::Utc;
use liveplay_common::events::LiveplayEvent;
use liveplay_common::model::items::DEFAULT_FADE_OUT_DURATION;
use liveplay_common::model::{AudioItem, CustomActionKind, DuckingBehavior};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::library::MediaLibrary;
use crate::playback::actions::ActionDispatcher;
use crate::playback::ducking::{self, DuckingPlan, VolumeChange};
use crate::playback::levels::{estimate_level, hold_peak};
use crate::playback::scheduler::{Scheduler, TaskId};
use crate::playback::sequencer;
use crate::playback::session::Session;
use crate::playback::transport::{
    playback_gain, secs, LoadRequest, Transport, TransportEvent, TransportId,
};
use crate::playback::types::{ActiveCue, MasterLevel};

/// Progress polling cadence
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed fade of a panic stop
pub const PANIC_FADE: Duration = Duration::from_millis(500);

/// Timer payloads
#[derive(Debug, Clone)]
pub(super) enum EngineTask {
    /// Sample a cue's position (owned by the cue)
    Poll { cue: Uuid },

    /// Fire a custom action (owned by the cue)
    CustomAction { action: CustomActionKind },

    /// A stop fade finished; release the voice
    FadeComplete { transport: TransportId },

    /// Panic window elapsed; release everything
    PanicComplete,
}

/// Cue-playback and sequencing engine
pub struct CueEngine {
    pub(super) library: Arc<dyn MediaLibrary>,

    pub(super) transport: Box<dyn Transport>,

    pub(super) actions: Box<dyn ActionDispatcher>,

    /// Active cues and groups
    pub(super) session: Session,

    pub(super) scheduler: Scheduler<EngineTask>,

    /// Engine clock (monotonic, from `tick`)
    pub(super) now: Duration,

    /// A panic fade is running; restores skip their fades
    pub(super) panic_pending: bool,

    /// Timer that ends the running panic window
    pub(super) panic_timer: Option<TaskId>,

    pub(super) master: MasterLevel,

    /// Events produced since the last `drain_events`
    pub(super) outbox: Vec<LiveplayEvent>,

    /// Nesting of chained triggers in the current call
    pub(super) trigger_depth: usize,
}

impl CueEngine {
    pub fn new(
        library: Arc<dyn MediaLibrary>,
        transport: Box<dyn Transport>,
        actions: Box<dyn ActionDispatcher>,
    ) -> Self {
        Self {
            library,
            transport,
            actions,
            session: Session::new(),
            scheduler: Scheduler::new(),
            now: Duration::ZERO,
            panic_pending: false,
            panic_timer: None,
            master: MasterLevel::default(),
            outbox: Vec::new(),
            trigger_depth: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn library(&self) -> &Arc<dyn MediaLibrary> {
        &self.library
    }

    /// Advance the engine clock to `now`
    ///
    /// Order within one tick: transport catches up and reports ended or
    /// failed voices, then every timer due at or before `now` runs in
    /// deadline order, then the master meter is refreshed.
    pub fn tick(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
        self.transport.advance(self.now);
        self.handle_transport_events();

        while let Some((_, task)) = self.scheduler.pop_due(self.now) {
            self.run_task(task);
        }

        self.refresh_master_level();
    }

    fn run_task(&mut self, task: EngineTask) {
        match task {
            EngineTask::Poll { cue } => self.poll_cue(cue),
            EngineTask::CustomAction { action } => self.execute_custom_action(action),
            EngineTask::FadeComplete { transport } => {
                self.transport.stop(transport);
                self.transport.unload(transport);
            }
            EngineTask::PanicComplete => self.finish_panic(),
        }
    }

    fn handle_transport_events(&mut self) {
        for event in self.transport.drain_events() {
            match event {
                TransportEvent::Ended { id } => {
                    let Some(uuid) = self.session.cue_by_transport(id) else {
                        continue;
                    };
                    let looping = self.session.cue(uuid).map(|c| c.looping).unwrap_or(false);
                    if looping {
                        continue;
                    }
                    self.on_cue_ended(uuid);
                }
                TransportEvent::Failed { id, message } => {
                    match self.session.cue_by_transport(id) {
                        Some(uuid) => {
                            error!("Playback failed for cue {}: {}", uuid, message);
                            self.abort_cue(uuid, message);
                        }
                        None => debug!("Ignoring failure of released {}: {}", id, message),
                    }
                }
            }
        }
    }

    // ========================================================================
    // Start
    // ========================================================================

    /// Start one audio item
    ///
    /// Returns `false` (and changes nothing) if the item is already active
    /// or its media cannot be loaded; `false` with teardown if playback
    /// fails to start.
    pub fn play_cue(&mut self, item: &AudioItem) -> bool {
        let uuid = item.uuid;
        if self.session.contains_cue(uuid) {
            warn!("Cue '{}' ({}) is already playing", item.display_name, uuid);
            return false;
        }

        let request = LoadRequest {
            source: self.library.media_path(item),
            volume: playback_gain(item.volume),
            looping: item.end_behavior.is_loop(),
            region: item.trim_region(),
            file_duration: item.duration,
        };
        let voice = match self.transport.load(request) {
            Ok(voice) => voice,
            Err(e) => {
                error!("Failed to load cue '{}': {}", item.display_name, e);
                self.emit(LiveplayEvent::CueFailed {
                    uuid,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                return false;
            }
        };

        // Registered before ducking so re-entrant lookups see it
        let seq = self.session.next_start_seq();
        self.session.insert_cue(ActiveCue::new(item, voice, seq));

        self.apply_ducking(uuid, &item.ducking_behavior);

        let parent = self.library.parent_group(uuid);
        let changes = sequencer::update_group_progress(&mut self.session, parent.as_ref(), uuid);
        self.emit_group_changes(&changes);

        if let Err(e) = self.transport.play(voice) {
            error!("Failed to start cue '{}': {}", item.display_name, e);
            self.abort_cue(uuid, e.to_string());
            return false;
        }

        info!(
            "Started cue '{}' ({:.2}s){}",
            item.display_name,
            item.effective_duration(),
            if item.end_behavior.is_loop() { " looping" } else { "" }
        );
        self.emit(LiveplayEvent::CueStarted {
            uuid,
            display_name: item.display_name.clone(),
            duration: item.effective_duration(),
            timestamp: Utc::now(),
        });

        // Timers are owned by the cue, so a stop triggered by the start
        // behavior below cancels them.
        self.schedule_custom_actions(item);
        self.scheduler
            .schedule_at(self.now + POLL_INTERVAL, Some(uuid), EngineTask::Poll { cue: uuid });

        self.handle_start_behavior(item);
        true
    }

    fn schedule_custom_actions(&mut self, item: &AudioItem) {
        let trim_start = item.trim_start();
        for custom in &item.custom_actions {
            let delay = custom.time_point - trim_start;
            if !(delay > 0.0) {
                debug!(
                    "Skipping custom action at {:.2}s before start of '{}'",
                    custom.time_point, item.display_name
                );
                continue;
            }
            self.scheduler.schedule_at(
                self.now + secs(delay),
                Some(item.uuid),
                EngineTask::CustomAction {
                    action: custom.action.clone(),
                },
            );
        }
    }

    // ========================================================================
    // Progress
    // ========================================================================

    fn poll_cue(&mut self, uuid: Uuid) {
        let Some(cue) = self.session.cue(uuid) else {
            return;
        };
        let Some(position) = self.transport.position(cue.transport) else {
            return;
        };

        let raw = position - cue.trim_start;
        // Whole files end on the transport's own end-of-media
        let reached_end = cue.windowed && !cue.looping && !cue.is_paused && raw >= cue.duration;
        let current_time = raw.clamp(0.0, cue.duration.max(0.0));
        let level = estimate_level(
            cue.volume,
            cue.peaks.as_deref(),
            current_time,
            cue.file_duration,
            cue.trim_start,
        );

        if let Some(cue) = self.session.cue_mut(uuid) {
            cue.current_time = current_time;
            cue.current_level = level;
            cue.peak_level = hold_peak(cue.peak_level, level);
        }
        sequencer::update_group_time(&mut self.session, uuid, current_time);

        if reached_end {
            debug!("Cue {} passed its window end, stopping transport", uuid);
            self.on_cue_ended(uuid);
            return;
        }

        self.scheduler
            .schedule_at(self.now + POLL_INTERVAL, Some(uuid), EngineTask::Poll { cue: uuid });
    }

    // ========================================================================
    // End / stop
    // ========================================================================

    /// Natural end of a non-looping cue
    fn on_cue_ended(&mut self, uuid: Uuid) {
        self.scheduler.cancel_owned(uuid);
        let Some(cue) = self.session.remove_cue(uuid) else {
            return;
        };
        self.transport.stop(cue.transport);
        self.transport.unload(cue.transport);

        let restores = ducking::restore_ducked_volumes(&mut self.session, uuid, &cue.ducking);
        self.apply_restores(&restores);

        debug!("Cue '{}' ended", cue.display_name);
        self.emit(LiveplayEvent::CueEnded {
            uuid,
            completed: true,
            timestamp: Utc::now(),
        });

        let completed = sequencer::complete_chain_member(&mut self.session, uuid);
        for group in &completed {
            self.emit_group_progress(group);
            self.emit(LiveplayEvent::GroupTrackingEnded {
                uuid: group.uuid,
                timestamp: Utc::now(),
            });
        }

        if !self.panic_pending {
            let started = self.handle_end_behavior(&cue.end_behavior, &cue.index);
            if !started {
                for group in &completed {
                    self.handle_group_end(group);
                }
            }
        }

        // Enclosing groups the chain did not continue into
        let changes = sequencer::release_chain_member(&mut self.session, uuid);
        self.emit_group_changes(&changes);
    }

    /// Fade out and release one cue
    ///
    /// The cue leaves the active set immediately; its voice is released
    /// once the fade-out completes.
    pub fn stop_cue(&mut self, uuid: Uuid) {
        if !self.session.contains_cue(uuid) {
            return;
        }
        self.scheduler.cancel_owned(uuid);

        let fade = self
            .library
            .resolve_by_uuid(uuid)
            .and_then(|item| item.as_audio().map(|a| a.fade_out_duration))
            .unwrap_or(DEFAULT_FADE_OUT_DURATION);

        let Some(ducking) = self.session.cue(uuid).map(|c| c.ducking.clone()) else {
            return;
        };
        let restores = ducking::restore_ducked_volumes(&mut self.session, uuid, &ducking);
        self.apply_restores(&restores);

        let Some(cue) = self.session.remove_cue(uuid) else {
            return;
        };
        let fade = secs(fade);
        debug!("Stopping cue '{}' with {:?} fade", cue.display_name, fade);
        self.emit(LiveplayEvent::CueEnded {
            uuid,
            completed: false,
            timestamp: Utc::now(),
        });

        let changes = sequencer::release_chain_member(&mut self.session, uuid);
        self.emit_group_changes(&changes);

        if fade.is_zero() {
            self.transport.stop(cue.transport);
            self.transport.unload(cue.transport);
        } else {
            self.transport
                .fade(cue.transport, playback_gain(cue.volume), 0.0, fade);
            self.scheduler.schedule_at(
                self.now + fade,
                None,
                EngineTask::FadeComplete {
                    transport: cue.transport,
                },
            );
        }
    }

    /// Halt and release every cue at once, no fades
    ///
    /// Also ends a running panic window, so cues started afterwards are
    /// not caught by it.
    pub fn stop_all_cues(&mut self) {
        let cues = self.session.cue_ids();
        if !cues.is_empty() {
            info!("Stopping all {} cues", cues.len());
        }
        if let Some(timer) = self.panic_timer.take() {
            self.scheduler.cancel(timer);
            debug!("Stop-all ended the panic window early");
        }
        self.panic_pending = false;
        self.release_everything();
    }

    /// Fade everything to silence over [`PANIC_FADE`], then release it all
    pub fn panic_stop(&mut self) {
        if self.panic_pending {
            debug!("Panic already in progress");
            return;
        }
        warn!("PANIC: fading out {} cues", self.session.cue_count());
        self.panic_pending = true;

        for uuid in self.session.cue_ids() {
            self.scheduler.cancel_owned(uuid);
            if let Some(cue) = self.session.cue_mut(uuid) {
                self.transport
                    .fade(cue.transport, playback_gain(cue.volume), 0.0, PANIC_FADE);
                cue.volume = 0.0;
            }
        }

        self.panic_timer = Some(self.scheduler.schedule_at(
            self.now + PANIC_FADE,
            None,
            EngineTask::PanicComplete,
        ));
        self.emit(LiveplayEvent::PanicStarted {
            timestamp: Utc::now(),
        });
    }

    fn finish_panic(&mut self) {
        self.panic_timer = None;
        self.release_everything();
        self.panic_pending = false;
        info!("Panic stop complete");
    }

    fn release_everything(&mut self) {
        for uuid in self.session.cue_ids() {
            self.scheduler.cancel_owned(uuid);
            if let Some(cue) = self.session.cue(uuid) {
                self.transport.stop(cue.transport);
                self.transport.unload(cue.transport);
            }
            self.emit(LiveplayEvent::CueEnded {
                uuid,
                completed: false,
                timestamp: Utc::now(),
            });
        }

        for uuid in self.session.group_ids() {
            self.emit(LiveplayEvent::GroupTrackingEnded {
                uuid,
                timestamp: Utc::now(),
            });
        }

        self.session.clear();
        self.refresh_master_level();
    }

    /// Tear down a cue whose transport failed
    fn abort_cue(&mut self, uuid: Uuid, reason: String) {
        self.scheduler.cancel_owned(uuid);
        let Some(cue) = self.session.remove_cue(uuid) else {
            return;
        };
        self.transport.stop(cue.transport);
        self.transport.unload(cue.transport);

        let restores = ducking::restore_ducked_volumes(&mut self.session, uuid, &cue.ducking);
        self.apply_restores(&restores);

        let changes = sequencer::release_chain_member(&mut self.session, uuid);
        self.emit_group_changes(&changes);

        self.emit(LiveplayEvent::CueFailed {
            uuid,
            reason,
            timestamp: Utc::now(),
        });
    }

    // ========================================================================
    // Pause / resume
    // ========================================================================

    /// Pause the transport only; the cue stays active
    pub fn pause_cue(&mut self, uuid: Uuid) -> bool {
        let Some(cue) = self.session.cue_mut(uuid) else {
            return false;
        };
        self.transport.pause(cue.transport);
        cue.is_paused = true;
        debug!("Paused cue '{}'", cue.display_name);
        true
    }

    pub fn resume_cue(&mut self, uuid: Uuid) -> bool {
        let Some(cue) = self.session.cue(uuid) else {
            return false;
        };
        if !cue.is_paused {
            return false;
        }
        let voice = cue.transport;
        if let Err(e) = self.transport.play(voice) {
            error!("Failed to resume cue {}: {}", uuid, e);
            self.abort_cue(uuid, e.to_string());
            return false;
        }
        if let Some(cue) = self.session.cue_mut(uuid) {
            cue.is_paused = false;
        }
        true
    }

    // ========================================================================
    // Ducking
    // ========================================================================

    fn apply_ducking(&mut self, new_cue: Uuid, behavior: &DuckingBehavior) {
        match ducking::apply_ducking(&mut self.session, new_cue, behavior) {
            DuckingPlan::Nothing => {}
            DuckingPlan::StopOthers(others) => {
                for uuid in others {
                    self.stop_cue(uuid);
                }
            }
            DuckingPlan::Ducked(changes) => {
                for change in changes {
                    self.fade_voice(&change);
                    self.emit(LiveplayEvent::CueDucked {
                        uuid: change.uuid,
                        ducked_by: new_cue,
                        volume: change.to,
                        timestamp: Utc::now(),
                    });
                }
            }
        }
    }

    fn apply_restores(&mut self, restores: &[VolumeChange]) {
        for change in restores {
            if !self.panic_pending {
                self.fade_voice(change);
            }
            self.emit(LiveplayEvent::CueRestored {
                uuid: change.uuid,
                volume: change.to,
                timestamp: Utc::now(),
            });
        }
    }

    fn fade_voice(&mut self, change: &VolumeChange) {
        self.transport.fade(
            change.transport,
            playback_gain(change.from),
            playback_gain(change.to),
            change.fade,
        );
    }
}
