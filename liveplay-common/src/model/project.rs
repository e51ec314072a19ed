//! Project file (`.liveplay`) structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::items::{AudioItem, Item};
use super::tree;
use crate::Result;

/// Number of cart trigger slots
pub const CART_SLOTS: u8 = 16;

/// One cart slot bound to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// 0-15
    pub slot: u8,
    pub item_uuid: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default)]
    pub mode: ThemeMode,
    #[serde(default = "default_accent")]
    pub accent_color: String,
}

fn default_accent() -> String {
    "#0066FF".to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ThemeMode::Dark,
            accent_color: default_accent(),
        }
    }
}

/// A show: playlist tree plus cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub folder_path: PathBuf,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    /// Items that exist only in the cart, not in the playlist
    #[serde(default)]
    pub cart_only_items: Vec<AudioItem>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Project {
    pub fn new(name: impl Into<String>, folder_path: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            version: default_version(),
            folder_path: folder_path.into(),
            items: Vec::new(),
            cart_items: Vec::new(),
            cart_only_items: Vec::new(),
            theme: Theme::default(),
            created_at: now,
            last_modified: now,
        }
    }

    /// Read a project file
    ///
    /// Index paths are recomputed from tree position so a hand-edited file
    /// cannot disagree with its own structure.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut project: Project = serde_json::from_str(&text)?;
        tree::renumber(&mut project.items, &[]);
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Playlist item by UUID, then cart-only items
    pub fn find_item(&self, uuid: Uuid) -> Option<Item> {
        if let Some(item) = tree::find_by_uuid(&self.items, uuid) {
            return Some(item.clone());
        }
        self.cart_only_items
            .iter()
            .find(|item| item.uuid == uuid)
            .map(|item| Item::Audio(item.clone()))
    }

    pub fn cart_slot(&self, slot: u8) -> Option<Uuid> {
        self.cart_items
            .iter()
            .find(|c| c.slot == slot)
            .map(|c| c.item_uuid)
    }

    /// Media file location: `<folder>/media/<file>`
    pub fn media_path(&self, item: &AudioItem) -> PathBuf {
        match &item.media_path {
            Some(relative) => self.folder_path.join(relative),
            None => self.folder_path.join("media").join(&item.media_file_name),
        }
    }
}
