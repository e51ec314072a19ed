//! Ducking coordinator
//!
//! Decides how a newly started cue affects the cues already sounding and
//! undoes it when the ducking cue ends. Functions here mutate only session
//! bookkeeping and return the volume changes for the engine to hand to the
//! transport.
//!
//! A cue may be ducked by several cues at once (`ducked_by`); it stays
//! ducked until the last of them ends. `original_volume` is captured once
//! per ducking episode.

use liveplay_common::model::DuckingBehavior;
use std::time::Duration;
use uuid::Uuid;

use super::session::Session;
use super::transport::{secs, TransportId};

/// A volume move the engine must apply to a voice
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeChange {
    pub uuid: Uuid,
    pub transport: TransportId,
    pub from: f32,
    pub to: f32,
    pub fade: Duration,
}

/// Result of [`apply_ducking`]
#[derive(Debug, Clone, PartialEq)]
pub enum DuckingPlan {
    /// `no-ducking`, or nothing else was active
    Nothing,

    /// Cues the engine must stop with their own fade-out, in start order
    StopOthers(Vec<Uuid>),

    /// Cues that were lowered
    Ducked(Vec<VolumeChange>),
}

/// React to `new_cue` starting with `behavior`
pub fn apply_ducking(session: &mut Session, new_cue: Uuid, behavior: &DuckingBehavior) -> DuckingPlan {
    let others: Vec<Uuid> = session
        .cue_ids()
        .into_iter()
        .filter(|uuid| *uuid != new_cue)
        .collect();

    if others.is_empty() {
        return DuckingPlan::Nothing;
    }

    match behavior {
        DuckingBehavior::NoDucking => DuckingPlan::Nothing,
        DuckingBehavior::StopAll => DuckingPlan::StopOthers(others),
        DuckingBehavior::DuckOthers {
            duck_level,
            duck_fade_in,
            ..
        } => {
            let level = duck_level.clamp(0.0, 1.0);
            let fade = secs(*duck_fade_in);
            let mut changes = Vec::new();
            for uuid in others {
                let Some(cue) = session.cue_mut(uuid) else {
                    continue;
                };
                if cue.ducked_by.contains(&new_cue) {
                    continue;
                }
                if !cue.is_ducked {
                    cue.original_volume = cue.volume;
                    cue.is_ducked = true;
                }
                cue.ducked_by.insert(new_cue);

                let target = cue.original_volume * level;
                changes.push(VolumeChange {
                    uuid,
                    transport: cue.transport,
                    from: cue.volume,
                    to: target,
                    fade,
                });
                cue.volume = target;
            }
            if changes.is_empty() {
                DuckingPlan::Nothing
            } else {
                DuckingPlan::Ducked(changes)
            }
        }
    }
}

/// Release the ducking held by `ending_cue`
///
/// `behavior` is the ending cue's ducking behavior as captured when it
/// started. Only cues whose `ducked_by` set becomes empty are restored.
pub fn restore_ducked_volumes(
    session: &mut Session,
    ending_cue: Uuid,
    behavior: &DuckingBehavior,
) -> Vec<VolumeChange> {
    let DuckingBehavior::DuckOthers { duck_fade_out, .. } = behavior else {
        return Vec::new();
    };
    let fade = secs(*duck_fade_out);

    let mut changes = Vec::new();
    for uuid in session.cue_ids() {
        let Some(cue) = session.cue_mut(uuid) else {
            continue;
        };
        if !cue.ducked_by.remove(&ending_cue) {
            continue;
        }
        if cue.ducked_by.is_empty() && cue.is_ducked {
            changes.push(VolumeChange {
                uuid,
                transport: cue.transport,
                from: cue.volume,
                to: cue.original_volume,
                fade,
            });
            cue.volume = cue.original_volume;
            cue.is_ducked = false;
        }
    }
    changes
}
