//! Start, end, ducking and custom-action behaviors attached to items
//!
//! JSON shapes follow the `.liveplay` project file: the discriminant is a
//! kebab-case tag (`action`, `mode` or `type`) and payload fields are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Default fade (seconds) when a ducking cue lowers other cues
pub const DEFAULT_DUCK_FADE_IN: f64 = 0.25;

/// Default fade (seconds) when ducked cues are restored
pub const DEFAULT_DUCK_FADE_OUT: f64 = 1.0;

/// Default volume multiplier applied by `duck-others`
pub const DEFAULT_DUCK_LEVEL: f32 = 0.2;

fn default_duck_level() -> f32 {
    DEFAULT_DUCK_LEVEL
}

fn default_duck_fade_in() -> f64 {
    DEFAULT_DUCK_FADE_IN
}

fn default_duck_fade_out() -> f64 {
    DEFAULT_DUCK_FADE_OUT
}

/// What happens when an audio item (or a tracked group chain) ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum EndBehavior {
    /// Stop here
    Nothing,

    /// Play the item immediately following in sibling order
    Next,

    /// Jump to an item by UUID
    #[serde(rename_all = "camelCase")]
    GotoItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_uuid: Option<Uuid>,
    },

    /// Jump to an item by index path
    #[serde(rename_all = "camelCase")]
    GotoIndex {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_index: Option<Vec<usize>>,
    },

    /// Repeat natively inside the transport; never re-triggered
    Loop,

    /// Action written by a newer client; treated like `Nothing`
    #[serde(other)]
    Unknown,
}

impl EndBehavior {
    pub fn is_loop(&self) -> bool {
        matches!(self, EndBehavior::Loop)
    }
}

impl Default for EndBehavior {
    /// Playlist items advance to the next item by default
    fn default() -> Self {
        EndBehavior::Next
    }
}

/// What an audio item triggers as soon as it starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum StartBehavior {
    #[default]
    Nothing,

    /// Start the next sibling alongside this item
    PlayNext,

    #[serde(rename_all = "camelCase")]
    PlayItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_uuid: Option<Uuid>,
    },

    #[serde(rename_all = "camelCase")]
    PlayIndex {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_index: Option<Vec<usize>>,
    },

    #[serde(other)]
    Unknown,
}

/// How a group starts when triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum GroupStartBehavior {
    /// Play the first audio item found depth-first and follow its chain
    #[default]
    PlayFirst,

    /// Start every direct child at once (never chain-tracked)
    PlayAll,
}

/// Effect a newly started cue has on the cues already sounding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DuckingBehavior {
    NoDucking,

    /// Stop every other active cue using its own fade-out
    StopAll,

    /// Lower every other active cue to `original * duck_level`
    #[serde(rename_all = "camelCase")]
    DuckOthers {
        #[serde(default = "default_duck_level")]
        duck_level: f32,
        #[serde(default = "default_duck_fade_in")]
        duck_fade_in: f64,
        #[serde(default = "default_duck_fade_out")]
        duck_fade_out: f64,
    },
}

impl DuckingBehavior {
    /// `duck-others` with the cart defaults
    pub fn duck_others(duck_level: f32) -> Self {
        DuckingBehavior::DuckOthers {
            duck_level,
            duck_fade_in: DEFAULT_DUCK_FADE_IN,
            duck_fade_out: DEFAULT_DUCK_FADE_OUT,
        }
    }

    pub fn ducks_others(&self) -> bool {
        matches!(self, DuckingBehavior::DuckOthers { .. })
    }
}

impl Default for DuckingBehavior {
    /// Playlist items stop everything else by default
    fn default() -> Self {
        DuckingBehavior::StopAll
    }
}

/// An action fired at a time point while an item plays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAction {
    /// Seconds into the media file (not into the trim window)
    pub time_point: f64,
    pub action: CustomActionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CustomActionKind {
    PlayItem { uuid: Uuid },
    PlayIndex { index: Vec<usize> },
    StopAll,
    HttpRequest { request: HttpRequest },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Form,
    Json,
}

/// Fire-and-forget HTTP request attached to a custom action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
}

impl HttpRequest {
    /// Form fields for an urlencoded body
    ///
    /// String values are sent verbatim, everything else uses its JSON text.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.body
            .iter()
            .flat_map(|body| body.iter())
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    }
}
