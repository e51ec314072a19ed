//! Media library accessor
//!
//! The engine never walks the project itself; it asks a `MediaLibrary` to
//! resolve UUIDs and index paths into owned item snapshots. A lookup that
//! returns `None` (item deleted, index out of range, no project) turns the
//! requested operation into a no-op.

use liveplay_common::model::{tree, AudioItem, GroupItem, Item, Project};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Read-only view of the loaded project used by the engine
pub trait MediaLibrary: Send + Sync {
    fn resolve_by_uuid(&self, uuid: Uuid) -> Option<Item>;

    fn resolve_by_index(&self, path: &[usize]) -> Option<Item>;

    /// Nearest enclosing group of an item (None at playlist root)
    fn parent_group(&self, uuid: Uuid) -> Option<GroupItem>;

    /// File the transport should load for `item`
    fn media_path(&self, item: &AudioItem) -> PathBuf;

    /// Item bound to a cart slot
    fn cart_slot(&self, slot: u8) -> Option<Uuid>;

    /// Snapshot of the whole project, if one is loaded
    fn project(&self) -> Option<Arc<Project>>;
}

/// `MediaLibrary` backed by an in-memory project that can be swapped
#[derive(Default)]
pub struct ProjectLibrary {
    current: RwLock<Option<Arc<Project>>>,
}

impl ProjectLibrary {
    pub fn new(project: Project) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(project))),
        }
    }

    /// Library with no project loaded
    pub fn empty() -> Self {
        Self::default()
    }

    /// Open a `.liveplay` project file
    pub fn open(path: &Path) -> Result<Self> {
        let project = Project::load(path)
            .map_err(|e| Error::Project(format!("{}: {}", path.display(), e)))?;
        info!(
            "Opened project '{}' ({} top-level items)",
            project.name,
            project.items.len()
        );
        Ok(Self::new(project))
    }

    pub fn replace(&self, project: Project) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(project));
    }

    pub fn clear(&self) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    fn snapshot(&self) -> Option<Arc<Project>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl MediaLibrary for ProjectLibrary {
    fn resolve_by_uuid(&self, uuid: Uuid) -> Option<Item> {
        self.snapshot()?.find_item(uuid)
    }

    fn resolve_by_index(&self, path: &[usize]) -> Option<Item> {
        let project = self.snapshot()?;
        tree::find_by_index(&project.items, path).cloned()
    }

    fn parent_group(&self, uuid: Uuid) -> Option<GroupItem> {
        let project = self.snapshot()?;
        tree::find_parent(&project.items, uuid).cloned()
    }

    fn media_path(&self, item: &AudioItem) -> PathBuf {
        match self.snapshot() {
            Some(project) => project.media_path(item),
            None => PathBuf::from(&item.media_file_name),
        }
    }

    fn cart_slot(&self, slot: u8) -> Option<Uuid> {
        self.snapshot()?.cart_slot(slot)
    }

    fn project(&self) -> Option<Arc<Project>> {
        self.snapshot()
    }
}
