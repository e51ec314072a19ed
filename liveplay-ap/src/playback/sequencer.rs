//! Group sequencer
//!
//! Computes the chain of items a `play-first` group plays through by
//! following end behaviors, and keeps the matching `ActiveGroup` in the
//! session up to date as chain members start, progress and end.
//!
//! Chain rules, starting from one audio item inside the group:
//! - `next` moves to the following audio item in depth-first order
//! - `goto-item` / `goto-index` move to the target when it is an audio item
//!   inside the same group
//! - a target already in the chain is a loop point: the chain ends there
//!   and the target is remembered as `loop_target`; when playback follows
//!   it, tracking restarts from the target
//! - anything else (`loop`, `nothing`, a target outside the group) ends
//!   the chain

use liveplay_common::model::{tree, AudioItem, EndBehavior, GroupItem, GroupStartBehavior};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use super::session::Session;
use super::types::ActiveGroup;

/// Ordered items a group will play automatically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackChain {
    pub items: Vec<Uuid>,
    /// Trimmed duration of each item, parallel to `items`
    pub durations: Vec<f64>,
    pub loop_target: Option<Uuid>,
}

impl PlaybackChain {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }
}

/// Tracking change the engine reports as an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChange {
    Started(Uuid),
    Progress(Uuid),
    Ended(Uuid),
}

/// Build the chain for `group`, starting at `starting` or its first audio item
///
/// `play-all` groups have no single linear position and always yield an
/// empty chain, as does a starting item that is not inside the group.
pub fn calculate_group_playback_chain(group: &GroupItem, starting: Option<Uuid>) -> PlaybackChain {
    if group.start_behavior == GroupStartBehavior::PlayAll {
        return PlaybackChain::default();
    }

    let members = tree::flatten_audio(&group.children);
    let start = match starting {
        Some(uuid) => members.iter().position(|a| a.uuid == uuid),
        None => tree::first_audio(&group.children)
            .and_then(|first| members.iter().position(|a| a.uuid == first.uuid)),
    };
    let Some(mut current) = start else {
        return PlaybackChain::default();
    };

    let mut chain = PlaybackChain::default();
    let mut visited = HashSet::new();

    loop {
        let item = members[current];
        visited.insert(item.uuid);
        chain.items.push(item.uuid);
        chain.durations.push(item.effective_duration());

        let Some(next) = follow_end_behavior(&members, current) else {
            break;
        };
        if visited.contains(&members[next].uuid) {
            chain.loop_target = Some(members[next].uuid);
            break;
        }
        current = next;
    }

    chain
}

/// Position in `members` that `members[current]` hands over to
fn follow_end_behavior(members: &[&AudioItem], current: usize) -> Option<usize> {
    match &members[current].end_behavior {
        EndBehavior::Next => {
            let next = current + 1;
            (next < members.len()).then_some(next)
        }
        EndBehavior::GotoItem {
            target_uuid: Some(target),
        } => members.iter().position(|a| a.uuid == *target),
        EndBehavior::GotoIndex {
            target_index: Some(target),
        } => members.iter().position(|a| a.index == *target),
        _ => None,
    }
}

/// Begin (or restart) tracking `group`
///
/// Nothing happens for an empty chain; any previous tracking is kept.
pub fn start_group_tracking(
    session: &mut Session,
    group: &GroupItem,
    starting: Option<Uuid>,
) -> Option<GroupChange> {
    let chain = calculate_group_playback_chain(group, starting);
    if chain.is_empty() {
        return None;
    }

    debug!(
        "Tracking group '{}': {} items, {:.2}s",
        group.display_name,
        chain.items.len(),
        chain.total_duration()
    );

    session.insert_group(ActiveGroup {
        uuid: group.uuid,
        display_name: group.display_name.clone(),
        total_duration: chain.total_duration(),
        current_time: 0.0,
        playback_chain: chain.items,
        current_item_index: 0,
        last_played_item: None,
        loop_target: chain.loop_target,
        durations: chain.durations,
        end_behavior: group.end_behavior.clone(),
        index: group.index.clone(),
    });
    Some(GroupChange::Started(group.uuid))
}

/// Record that `item` started playing
///
/// `parent` is the item's nearest enclosing group (if any). Other tracked
/// groups whose chain contains the item, such as an outer group flattening
/// a nested one, only advance their position.
pub fn update_group_progress(
    session: &mut Session,
    parent: Option<&GroupItem>,
    item: Uuid,
) -> Vec<GroupChange> {
    let mut changes = Vec::new();

    if let Some(parent) = parent {
        let restart = match session.group(parent.uuid) {
            None => true,
            Some(active) => match active.position_of(item) {
                None => true,
                Some(position) => active
                    .last_played_item
                    .and_then(|last| active.position_of(last))
                    .map(|last| position < last)
                    .unwrap_or(false),
            },
        };

        if restart {
            changes.extend(start_group_tracking(session, parent, Some(item)));
        }
        if let Some(change) = advance(session, parent.uuid, item) {
            if !restart {
                changes.push(change);
            }
        }
    }

    for group in session.groups_containing(item) {
        if parent.map(|p| p.uuid) == Some(group) {
            continue;
        }
        changes.extend(advance(session, group, item));
    }

    changes
}

fn advance(session: &mut Session, group: Uuid, item: Uuid) -> Option<GroupChange> {
    let active = session.group_mut(group)?;
    let position = active.position_of(item)?;
    active.current_item_index = position;
    active.current_time = active.offset_of(position);
    active.last_played_item = Some(item);
    Some(GroupChange::Progress(group))
}

/// Fold a chain member's elapsed time into its groups
pub fn update_group_time(session: &mut Session, item: Uuid, elapsed: f64) {
    for group in session.groups_containing(item) {
        if let Some(active) = session.group_mut(group) {
            if active.last_played_item != Some(item) {
                continue;
            }
            if let Some(position) = active.position_of(item) {
                let duration = active.durations[position];
                active.current_time = active.offset_of(position) + elapsed.clamp(0.0, duration);
            }
        }
    }
}

/// A chain member ended naturally
///
/// Group time moves to the end of the member. Groups for which it was the
/// last chain item are torn down and returned.
pub fn complete_chain_member(session: &mut Session, item: Uuid) -> Vec<ActiveGroup> {
    let mut completed = Vec::new();
    for group in session.groups_containing(item) {
        let Some(active) = session.group_mut(group) else {
            continue;
        };
        if let Some(position) = active.position_of(item) {
            active.current_time = active.offset_of(position + 1);
        }
        if active.is_last(item) {
            if let Some(removed) = session.remove_group(group) {
                debug!("Group '{}' chain complete", removed.display_name);
                completed.push(removed);
            }
        }
    }
    completed
}

/// A chain member was stopped; drop groups with no member left sounding
pub fn release_chain_member(session: &mut Session, item: Uuid) -> Vec<GroupChange> {
    let mut changes = Vec::new();
    for group in session.groups_containing(item) {
        if session.chain_has_active_member(group) {
            continue;
        }
        if let Some(removed) = stop_group_tracking(session, group) {
            changes.push(GroupChange::Ended(removed.uuid));
        }
    }
    changes
}

pub fn stop_group_tracking(session: &mut Session, group: Uuid) -> Option<ActiveGroup> {
    session.remove_group(group)
}
