//! Audio and group items of a project playlist

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::behaviors::{
    CustomAction, DuckingBehavior, EndBehavior, GroupStartBehavior, StartBehavior,
};

/// Default fade-out (seconds) applied when a cue is stopped manually
pub const DEFAULT_FADE_OUT_DURATION: f64 = 1.0;

fn default_volume() -> f32 {
    1.0
}

fn default_fade_out_duration() -> f64 {
    DEFAULT_FADE_OUT_DURATION
}

/// Cached waveform (normalized peak magnitudes 0-1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WaveformData {
    #[serde(default)]
    pub length: usize,
    /// Total media duration covered by `peaks`, in seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub peaks: Vec<f32>,
}

/// Sub-region of a media file actually played (seconds, file-relative)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRegion {
    pub start: f64,
    pub end: f64,
}

impl TrimRegion {
    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// A playable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioItem {
    pub uuid: Uuid,
    #[serde(default)]
    pub index: Vec<usize>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub media_file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<WaveformData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_point: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_point: Option<f64>,
    /// Total file duration in seconds
    #[serde(default)]
    pub duration: f64,
    /// Linear gain: 0 silent, 1 unity, >1 boosted
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub end_behavior: EndBehavior,
    #[serde(default)]
    pub start_behavior: StartBehavior,
    #[serde(default)]
    pub custom_actions: Vec<CustomAction>,
    #[serde(default)]
    pub ducking_behavior: DuckingBehavior,
    #[serde(default = "default_fade_out_duration")]
    pub fade_out_duration: f64,
}

impl AudioItem {
    /// New playlist item with playlist defaults (`next`, `stop-all`)
    pub fn new(display_name: impl Into<String>, duration: f64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            index: Vec::new(),
            display_name: display_name.into(),
            color: "#FF0000".to_string(),
            media_file_name: String::new(),
            media_path: None,
            waveform_path: None,
            waveform: None,
            in_point: None,
            out_point: None,
            duration,
            volume: default_volume(),
            end_behavior: EndBehavior::Next,
            start_behavior: StartBehavior::Nothing,
            custom_actions: Vec::new(),
            ducking_behavior: DuckingBehavior::StopAll,
            fade_out_duration: DEFAULT_FADE_OUT_DURATION,
        }
    }

    /// New cart item with cart defaults (`nothing`, `duck-others` at 0.2)
    pub fn new_cart(display_name: impl Into<String>, duration: f64) -> Self {
        Self {
            end_behavior: EndBehavior::Nothing,
            ducking_behavior: DuckingBehavior::duck_others(super::behaviors::DEFAULT_DUCK_LEVEL),
            ..Self::new(display_name, duration)
        }
    }

    /// Sprite window, present when either trim point is set
    ///
    /// A zero trim point counts as unset, matching how project files mark
    /// "whole file".
    pub fn trim_region(&self) -> Option<TrimRegion> {
        let in_point = self.in_point.filter(|p| *p > 0.0);
        let out_point = self.out_point.filter(|p| *p > 0.0);
        if in_point.is_none() && out_point.is_none() {
            return None;
        }
        Some(TrimRegion {
            start: in_point.unwrap_or(0.0),
            end: out_point.unwrap_or(self.duration),
        })
    }

    /// Trimmed length if trim points are set, else the file duration
    pub fn effective_duration(&self) -> f64 {
        match self.trim_region() {
            Some(region) => region.length(),
            None => self.duration.max(0.0),
        }
    }

    /// Trimmed start (0 when untrimmed)
    pub fn trim_start(&self) -> f64 {
        self.trim_region().map(|r| r.start).unwrap_or(0.0)
    }
}

/// A container of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupItem {
    pub uuid: Uuid,
    #[serde(default)]
    pub index: Vec<usize>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub children: Vec<Item>,
    #[serde(default)]
    pub start_behavior: GroupStartBehavior,
    #[serde(default = "group_end_default")]
    pub end_behavior: EndBehavior,
    #[serde(default)]
    pub is_expanded: bool,
}

fn group_end_default() -> EndBehavior {
    EndBehavior::Nothing
}

impl GroupItem {
    pub fn new(display_name: impl Into<String>, children: Vec<Item>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            index: Vec::new(),
            display_name: display_name.into(),
            color: "#0066FF".to_string(),
            children,
            start_behavior: GroupStartBehavior::PlayFirst,
            end_behavior: EndBehavior::Nothing,
            is_expanded: true,
        }
    }
}

/// Playlist entry: audio item or (arbitrarily nested) group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    Audio(AudioItem),
    Group(GroupItem),
}

impl Item {
    pub fn uuid(&self) -> Uuid {
        match self {
            Item::Audio(a) => a.uuid,
            Item::Group(g) => g.uuid,
        }
    }

    pub fn index(&self) -> &[usize] {
        match self {
            Item::Audio(a) => &a.index,
            Item::Group(g) => &g.index,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Item::Audio(a) => &a.display_name,
            Item::Group(g) => &g.display_name,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioItem> {
        match self {
            Item::Audio(a) => Some(a),
            Item::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupItem> {
        match self {
            Item::Group(g) => Some(g),
            Item::Audio(_) => None,
        }
    }

    pub(crate) fn set_index(&mut self, index: Vec<usize>) {
        match self {
            Item::Audio(a) => a.index = index,
            Item::Group(g) => g.index = index,
        }
    }
}

impl From<AudioItem> for Item {
    fn from(item: AudioItem) -> Self {
        Item::Audio(item)
    }
}

impl From<GroupItem> for Item {
    fn from(group: GroupItem) -> Self {
        Item::Group(group)
    }
}
