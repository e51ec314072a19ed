//! Runtime playback records
//!
//! `ActiveCue` and `ActiveGroup` exist only while something is sounding or
//! being sequenced; they are never persisted. Serialization skips transport
//! handles and engine bookkeeping so snapshots can go straight to JSON.

use chrono::{DateTime, Utc};
use liveplay_common::levels::SILENCE_DB;
use liveplay_common::model::{AudioItem, DuckingBehavior, EndBehavior};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use super::transport::TransportId;

/// One currently sounding audio item
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCue {
    pub uuid: Uuid,
    pub index: Vec<usize>,
    pub display_name: String,
    pub color: String,

    /// Trimmed length if trim points are set, else the file duration
    pub duration: f64,

    /// Seconds elapsed inside the trim window, always within `0..=duration`
    pub current_time: f64,

    /// Current linear volume (lowered while ducked)
    pub volume: f32,

    /// Volume before the current ducking episode
    pub original_volume: f32,

    pub is_ducked: bool,

    /// Cues currently ducking this one; restored when it becomes empty
    pub ducked_by: BTreeSet<Uuid>,

    pub in_point: Option<f64>,
    pub out_point: Option<f64>,

    pub is_paused: bool,

    /// Repeats natively in the transport
    pub looping: bool,

    /// Estimated level in dB (-60..0)
    pub current_level: f32,

    /// Held peak of `current_level`
    pub peak_level: f32,

    pub started_at: DateTime<Utc>,

    /// Voice handle inside the transport
    #[serde(skip)]
    pub transport: TransportId,

    /// Ducking behavior as it was when the cue started
    #[serde(skip)]
    pub ducking: DuckingBehavior,

    /// Seconds from file start to the trim window start
    #[serde(skip)]
    pub trim_start: f64,

    /// Plays a sprite window rather than the whole file
    #[serde(skip)]
    pub windowed: bool,

    /// Whole-file duration, used to index waveform peaks
    #[serde(skip)]
    pub file_duration: f64,

    #[serde(skip)]
    pub peaks: Option<Arc<[f32]>>,

    /// End behavior as it was when the cue started
    #[serde(skip)]
    pub end_behavior: EndBehavior,

    /// Start order, for deterministic iteration
    #[serde(skip)]
    pub(crate) start_seq: u64,
}

impl ActiveCue {
    /// Fresh record for `item` at its nominal volume
    pub fn new(item: &AudioItem, transport: TransportId, start_seq: u64) -> Self {
        Self {
            uuid: item.uuid,
            index: item.index.clone(),
            display_name: item.display_name.clone(),
            color: item.color.clone(),
            duration: item.effective_duration(),
            current_time: 0.0,
            volume: item.volume,
            original_volume: item.volume,
            is_ducked: false,
            ducked_by: BTreeSet::new(),
            in_point: item.in_point,
            out_point: item.out_point,
            is_paused: false,
            looping: item.end_behavior.is_loop(),
            current_level: SILENCE_DB,
            peak_level: SILENCE_DB,
            started_at: Utc::now(),
            transport,
            ducking: item.ducking_behavior.clone(),
            trim_start: item.trim_start(),
            windowed: item.trim_region().is_some(),
            file_duration: item.duration,
            peaks: item
                .waveform
                .as_ref()
                .filter(|w| !w.peaks.is_empty())
                .map(|w| Arc::from(w.peaks.as_slice())),
            end_behavior: item.end_behavior.clone(),
            start_seq,
        }
    }
}

/// A play-first group whose chain is being followed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGroup {
    pub uuid: Uuid,
    pub display_name: String,

    /// Sum of the trimmed durations of every chain member
    pub total_duration: f64,

    /// Seconds elapsed across the chain
    pub current_time: f64,

    /// Items that will play in order, following end behaviors
    pub playback_chain: Vec<Uuid>,

    pub current_item_index: usize,

    pub last_played_item: Option<Uuid>,

    /// Chain member the last item jumps back to, if the chain loops
    pub loop_target: Option<Uuid>,

    /// Trimmed duration of each chain member, parallel to `playback_chain`
    #[serde(skip)]
    pub durations: Vec<f64>,

    /// Group's own end behavior, evaluated when the chain completes
    #[serde(skip)]
    pub end_behavior: EndBehavior,

    #[serde(skip)]
    pub index: Vec<usize>,
}

impl ActiveGroup {
    /// Seconds of chain played before member `position` starts
    pub fn offset_of(&self, position: usize) -> f64 {
        self.durations.iter().take(position).sum()
    }

    pub fn position_of(&self, item: Uuid) -> Option<usize> {
        self.playback_chain.iter().position(|u| *u == item)
    }

    pub fn is_last(&self, item: Uuid) -> bool {
        self.playback_chain.last() == Some(&item)
    }
}

/// Combined output meter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterLevel {
    pub level: f32,
    pub peak: f32,
}

impl Default for MasterLevel {
    fn default() -> Self {
        Self {
            level: SILENCE_DB,
            peak: SILENCE_DB,
        }
    }
}

/// Read-only view of the engine for meters, progress bars and the inspector
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    /// Active cues in start order
    pub active_cues: Vec<ActiveCue>,
    pub active_groups: Vec<ActiveGroup>,
    pub master: MasterLevel,
    pub panic_pending: bool,
}

impl EngineSnapshot {
    pub fn cue(&self, uuid: Uuid) -> Option<&ActiveCue> {
        self.active_cues.iter().find(|c| c.uuid == uuid)
    }

    pub fn group(&self, uuid: Uuid) -> Option<&ActiveGroup> {
        self.active_groups.iter().find(|g| g.uuid == uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_cue_serialization_skips_handles() {
        let mut item = AudioItem::new("Thunder", 12.0);
        item.in_point = Some(2.0);
        item.out_point = Some(5.0);
        let cue = ActiveCue::new(&item, TransportId(7), 0);

        let json = serde_json::to_value(&cue).unwrap();
        assert_eq!(json["duration"], 3.0);
        assert_eq!(json["displayName"], "Thunder");
        assert!(json.get("transport").is_none());
        assert!(json.get("peaks").is_none());
        assert_eq!(json["duckedBy"], serde_json::json!([]));
    }

    #[test]
    fn test_group_offsets() {
        let group = ActiveGroup {
            uuid: Uuid::new_v4(),
            display_name: "Act 1".to_string(),
            total_duration: 6.0,
            current_time: 0.0,
            playback_chain: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
            current_item_index: 0,
            last_played_item: None,
            loop_target: None,
            durations: vec![1.0, 2.0, 3.0],
            end_behavior: EndBehavior::Nothing,
            index: vec![0],
        };
        assert_eq!(group.offset_of(0), 0.0);
        assert_eq!(group.offset_of(2), 3.0);
        assert!(group.is_last(group.playback_chain[2]));
    }
}
