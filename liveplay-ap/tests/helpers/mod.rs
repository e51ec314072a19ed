//! Test helpers for liveplay-ap integration tests
//!
//! Provides:
//! - Item and project builders with renumbered index paths
//! - `Rig`: a `CueEngine` over a `ClockTransport` probe and a
//!   `RecordingDispatcher`, stepped in 10 ms ticks like the runtime would

#![allow(dead_code)]

use liveplay_ap::library::ProjectLibrary;
use liveplay_ap::playback::{
    ActiveCue, ClockTransport, CueEngine, RecordingDispatcher, TransportId,
};
use liveplay_common::events::LiveplayEvent;
use liveplay_common::model::{
    tree, AudioItem, CartItem, DuckingBehavior, EndBehavior, GroupItem, Item, Project,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Engine clock step used by `Rig::advance_ms`
pub const STEP_MS: u64 = 10;

pub fn audio(name: &str, duration: f64) -> AudioItem {
    let mut item = AudioItem::new(name, duration);
    item.media_file_name = format!("{}.wav", name.to_lowercase().replace(' ', "-"));
    item
}

/// Audio item that neither stops nor ducks others and stops when done
pub fn quiet(name: &str, duration: f64) -> AudioItem {
    let mut item = audio(name, duration);
    item.ducking_behavior = DuckingBehavior::NoDucking;
    item.end_behavior = EndBehavior::Nothing;
    item
}

pub fn with_end(mut item: AudioItem, end: EndBehavior) -> AudioItem {
    item.end_behavior = end;
    item
}

pub fn group(name: &str, children: Vec<Item>) -> GroupItem {
    GroupItem::new(name, children)
}

/// Project with `items` on the playlist, index paths recomputed
pub fn project(items: Vec<Item>) -> Project {
    let mut project = Project::new("Test Show", "/shows/test");
    project.items = items;
    tree::renumber(&mut project.items, &[]);
    project
}

pub fn with_cart(mut project: Project, slot: u8, item: AudioItem) -> Project {
    project.cart_items.push(CartItem {
        slot,
        item_uuid: item.uuid,
    });
    project.cart_only_items.push(item);
    project
}

/// Item from the renumbered project tree (so its index path is set)
pub fn item_in(project: &Project, uuid: Uuid) -> Item {
    project.find_item(uuid).expect("item in project")
}

pub struct Rig {
    pub engine: CueEngine,
    pub transport: ClockTransport,
    pub actions: RecordingDispatcher,
    pub library: Arc<ProjectLibrary>,
    now_ms: u64,
}

impl Rig {
    pub fn new(project: Project) -> Self {
        let transport = ClockTransport::new();
        let actions = RecordingDispatcher::new();
        let library = Arc::new(ProjectLibrary::new(project));
        let engine = CueEngine::new(
            library.clone(),
            Box::new(transport.clone()),
            Box::new(actions.clone()),
        );
        Self {
            engine,
            transport,
            actions,
            library,
            now_ms: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move the clock forward in `STEP_MS` ticks
    pub fn advance_ms(&mut self, ms: u64) {
        let target = self.now_ms + ms;
        while self.now_ms < target {
            self.now_ms = (self.now_ms + STEP_MS).min(target);
            self.engine.tick(Duration::from_millis(self.now_ms));
        }
    }

    /// Advance, calling `check` after every tick
    pub fn advance_checking(&mut self, ms: u64, mut check: impl FnMut(&CueEngine)) {
        let target = self.now_ms + ms;
        while self.now_ms < target {
            self.now_ms = (self.now_ms + STEP_MS).min(target);
            self.engine.tick(Duration::from_millis(self.now_ms));
            check(&self.engine);
        }
    }

    pub fn cue(&self, uuid: Uuid) -> Option<&ActiveCue> {
        self.engine.session().cue(uuid)
    }

    pub fn is_active(&self, uuid: Uuid) -> bool {
        self.engine.session().contains_cue(uuid)
    }

    pub fn voice(&self, uuid: Uuid) -> TransportId {
        self.cue(uuid).expect("cue is active").transport
    }

    pub fn events(&mut self) -> Vec<LiveplayEvent> {
        self.engine.drain_events()
    }
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

pub fn count_events(events: &[LiveplayEvent], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type() == event_type).count()
}
