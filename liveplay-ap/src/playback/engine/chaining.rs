//! Triggers and chained playback
//!
//! **Responsibilities:**
//! - Resolving UUIDs, index paths and cart slots into cues or groups
//! - Group start (`play-first` / `play-all`)
//! - Start and end behaviors, including a tracked group's own end behavior
//! - Custom action execution

use liveplay_common::model::{
    tree, AudioItem, CustomActionKind, EndBehavior, GroupItem, GroupStartBehavior, Item,
    StartBehavior,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::core::CueEngine;
use crate::playback::sequencer::{self, GroupChange};
use crate::playback::types::ActiveGroup;

/// Chained triggers nested deeper than this are dropped
const MAX_TRIGGER_DEPTH: usize = 64;

/// Something an operator or a behavior can fire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "kebab-case")]
pub enum TriggerTarget {
    Uuid { uuid: Uuid },
    Index { index: Vec<usize> },
    Cart { slot: u8 },
}

impl CueEngine {
    /// Fire a target; `false` if it resolves to nothing or nothing started
    pub fn trigger(&mut self, target: &TriggerTarget) -> bool {
        match target {
            TriggerTarget::Uuid { uuid } => self.trigger_by_uuid(*uuid),
            TriggerTarget::Index { index } => self.trigger_by_index(index),
            TriggerTarget::Cart { slot } => self.trigger_cart_slot(*slot),
        }
    }

    pub fn trigger_by_uuid(&mut self, uuid: Uuid) -> bool {
        match self.library.resolve_by_uuid(uuid) {
            Some(item) => self.trigger_item(&item),
            None => {
                debug!("Trigger: no item {}", uuid);
                false
            }
        }
    }

    pub fn trigger_by_index(&mut self, index: &[usize]) -> bool {
        match self.library.resolve_by_index(index) {
            Some(item) => self.trigger_item(&item),
            None => {
                debug!("Trigger: nothing at index {:?}", index);
                false
            }
        }
    }

    pub fn trigger_cart_slot(&mut self, slot: u8) -> bool {
        match self.library.cart_slot(slot) {
            Some(uuid) => self.trigger_by_uuid(uuid),
            None => {
                debug!("Trigger: cart slot {} is empty", slot);
                false
            }
        }
    }

    fn trigger_item(&mut self, item: &Item) -> bool {
        if self.trigger_depth >= MAX_TRIGGER_DEPTH {
            warn!(
                "Dropping trigger of '{}': chained triggers nested too deep",
                item.display_name()
            );
            return false;
        }

        self.trigger_depth += 1;
        let started = match item {
            Item::Audio(audio) => self.play_cue(audio),
            Item::Group(group) => self.trigger_group(group),
        };
        self.trigger_depth -= 1;
        started
    }

    /// Start a group according to its start behavior
    pub fn trigger_group(&mut self, group: &GroupItem) -> bool {
        info!("Triggering group '{}'", group.display_name);
        match group.start_behavior {
            GroupStartBehavior::PlayFirst => {
                let changes: Vec<_> =
                    sequencer::start_group_tracking(&mut self.session, group, None)
                        .into_iter()
                        .collect();
                self.emit_group_changes(&changes);

                let Some(first) = tree::first_audio(&group.children) else {
                    debug!("Group '{}' has no audio items", group.display_name);
                    return false;
                };
                let first = Item::Audio(first.clone());
                let started = self.trigger_item(&first);

                // A chain that never got a member sounding is not tracked
                if !started && !self.session.chain_has_active_member(group.uuid) {
                    if let Some(dropped) =
                        sequencer::stop_group_tracking(&mut self.session, group.uuid)
                    {
                        debug!("Group '{}' did not start, tracking dropped", dropped.display_name);
                        self.emit_group_changes(&[GroupChange::Ended(dropped.uuid)]);
                    }
                }
                started
            }
            GroupStartBehavior::PlayAll => {
                let mut any = false;
                for child in &group.children {
                    any |= self.trigger_item(child);
                }
                any
            }
        }
    }

    /// Play the sibling right after `index`
    pub fn play_next_item(&mut self, index: &[usize]) -> bool {
        match tree::next_sibling_index(index) {
            Some(next) => self.trigger_by_index(&next),
            None => false,
        }
    }

    pub(super) fn handle_start_behavior(&mut self, item: &AudioItem) {
        match &item.start_behavior {
            StartBehavior::PlayNext => {
                self.play_next_item(&item.index);
            }
            StartBehavior::PlayItem {
                target_uuid: Some(target),
            } => {
                self.trigger_by_uuid(*target);
            }
            StartBehavior::PlayIndex {
                target_index: Some(target),
            } => {
                self.trigger_by_index(target);
            }
            _ => {}
        }
    }

    /// Run an end behavior; `true` if it started something
    pub(super) fn handle_end_behavior(&mut self, behavior: &EndBehavior, index: &[usize]) -> bool {
        match behavior {
            EndBehavior::Next => self.play_next_item(index),
            EndBehavior::GotoItem {
                target_uuid: Some(target),
            } => self.trigger_by_uuid(*target),
            EndBehavior::GotoIndex {
                target_index: Some(target),
            } => self.trigger_by_index(target),
            // Loop repeats inside the transport
            _ => false,
        }
    }

    /// A tracked chain completed without its last item starting anything
    pub(super) fn handle_group_end(&mut self, group: &ActiveGroup) {
        debug!(
            "Group '{}' finished, end behavior {:?}",
            group.display_name, group.end_behavior
        );
        match &group.end_behavior {
            EndBehavior::Loop => {
                self.trigger_by_uuid(group.uuid);
            }
            other => {
                self.handle_end_behavior(other, &group.index);
            }
        }
    }

    pub(super) fn execute_custom_action(&mut self, action: CustomActionKind) {
        match action {
            CustomActionKind::PlayItem { uuid } => {
                self.trigger_by_uuid(uuid);
            }
            CustomActionKind::PlayIndex { index } => {
                self.trigger_by_index(&index);
            }
            CustomActionKind::StopAll => self.stop_all_cues(),
            CustomActionKind::HttpRequest { request } => {
                debug!("Custom action: {} {}", request.method.as_str(), request.url);
                self.actions.dispatch(request);
            }
        }
    }
}
