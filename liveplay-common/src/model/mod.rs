//! Durable project model
//!
//! Items form a tree: an `Item` is either an `AudioItem` or a `GroupItem`
//! whose children are again items. Runtime playback state never lives here.

pub mod behaviors;
pub mod items;
pub mod project;
pub mod tree;

pub use behaviors::{
    ContentType, CustomAction, CustomActionKind, DuckingBehavior, EndBehavior,
    GroupStartBehavior, HttpMethod, HttpRequest, StartBehavior,
};
pub use items::{AudioItem, GroupItem, Item, TrimRegion, WaveformData};
pub use project::{CartItem, Project, Theme, ThemeMode, CART_SLOTS};
