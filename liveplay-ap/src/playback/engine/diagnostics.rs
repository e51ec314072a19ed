//! Snapshots, meters and the event outbox
//!
//! **Responsibilities:**
//! - Read-only accessors (`snapshot`, `session`, `is_panic_pending`)
//! - Master meter refresh
//! - Event outbox (`emit`, `drain_events`) and group event construction

use chrono::Utc;
use liveplay_common::events::LiveplayEvent;

use super::core::CueEngine;
use crate::playback::levels::update_master_level;
use crate::playback::sequencer::GroupChange;
use crate::playback::session::Session;
use crate::playback::types::{ActiveGroup, EngineSnapshot, MasterLevel};

impl CueEngine {
    /// Copy of the active cues and groups, without transport handles
    pub fn snapshot(&self) -> EngineSnapshot {
        self.session.snapshot(self.master, self.panic_pending)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn master_level(&self) -> MasterLevel {
        self.master
    }

    pub fn is_panic_pending(&self) -> bool {
        self.panic_pending
    }

    /// Timers still scheduled (polls, custom actions, fades)
    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    /// Take every event produced since the last call
    pub fn drain_events(&mut self) -> Vec<LiveplayEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub(super) fn emit(&mut self, event: LiveplayEvent) {
        self.outbox.push(event);
    }

    pub(super) fn refresh_master_level(&mut self) {
        let levels: Vec<f32> = self.session.cues().map(|c| c.current_level).collect();
        self.master = update_master_level(self.master, levels);
    }

    pub(super) fn emit_group_changes(&mut self, changes: &[GroupChange]) {
        for change in changes {
            match *change {
                GroupChange::Started(uuid) => {
                    let Some(group) = self.session.group(uuid) else {
                        continue;
                    };
                    let event = LiveplayEvent::GroupTrackingStarted {
                        uuid,
                        display_name: group.display_name.clone(),
                        total_duration: group.total_duration,
                        chain: group.playback_chain.clone(),
                        timestamp: Utc::now(),
                    };
                    self.emit(event);
                }
                GroupChange::Progress(uuid) => {
                    if let Some(group) = self.session.group(uuid).cloned() {
                        self.emit_group_progress(&group);
                    }
                }
                GroupChange::Ended(uuid) => self.emit(LiveplayEvent::GroupTrackingEnded {
                    uuid,
                    timestamp: Utc::now(),
                }),
            }
        }
    }

    pub(super) fn emit_group_progress(&mut self, group: &ActiveGroup) {
        self.emit(LiveplayEvent::GroupProgress {
            uuid: group.uuid,
            current_time: group.current_time,
            total_duration: group.total_duration,
            current_item_index: group.current_item_index,
            timestamp: Utc::now(),
        });
    }
}
