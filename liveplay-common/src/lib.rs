//! # LivePlay Common Library
//!
//! Shared code for the LivePlay cue player including:
//! - Project data model (audio items, groups, behaviors, cart slots)
//! - Pure tree traversal over nested groups
//! - Event types (LiveplayEvent enum) and the EventBus
//! - Configuration loading
//! - Gain/level conversion helpers and fade curves

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod levels;
pub mod model;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use model::{AudioItem, GroupItem, Item, Project};
