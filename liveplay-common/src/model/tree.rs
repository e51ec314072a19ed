//! Depth-first traversal helpers over nested playlist items
//!
//! All helpers are pure functions over an immutable item slice; nothing
//! keeps a back-pointer to its parent.

use uuid::Uuid;

use super::items::{AudioItem, GroupItem, Item};

/// Find any item (audio or group) by UUID
pub fn find_by_uuid(items: &[Item], uuid: Uuid) -> Option<&Item> {
    for item in items {
        if item.uuid() == uuid {
            return Some(item);
        }
        if let Item::Group(group) = item {
            if let Some(found) = find_by_uuid(&group.children, uuid) {
                return Some(found);
            }
        }
    }
    None
}

/// Walk an index path such as `[2, 0, 1]`
///
/// Every segment but the last must land on a group; an out-of-range
/// segment or a path through an audio item resolves to nothing.
pub fn find_by_index<'a>(items: &'a [Item], path: &[usize]) -> Option<&'a Item> {
    let (last, parents) = path.split_last()?;
    let mut level = items;
    for segment in parents {
        match level.get(*segment)? {
            Item::Group(group) => level = &group.children,
            Item::Audio(_) => return None,
        }
    }
    level.get(*last)
}

/// Nearest enclosing group of the item with `uuid`
///
/// Items at the playlist root have no parent.
pub fn find_parent(items: &[Item], uuid: Uuid) -> Option<&GroupItem> {
    for item in items {
        if let Item::Group(group) = item {
            if group.children.iter().any(|child| child.uuid() == uuid) {
                return Some(group);
            }
            if let Some(found) = find_parent(&group.children, uuid) {
                return Some(found);
            }
        }
    }
    None
}

/// Every audio item under `items`, depth-first in playlist order
pub fn flatten_audio(items: &[Item]) -> Vec<&AudioItem> {
    let mut out = Vec::new();
    collect_audio(items, &mut out);
    out
}

fn collect_audio<'a>(items: &'a [Item], out: &mut Vec<&'a AudioItem>) {
    for item in items {
        match item {
            Item::Audio(audio) => out.push(audio),
            Item::Group(group) => collect_audio(&group.children, out),
        }
    }
}

/// First audio item found depth-first
pub fn first_audio(items: &[Item]) -> Option<&AudioItem> {
    for item in items {
        match item {
            Item::Audio(audio) => return Some(audio),
            Item::Group(group) => {
                if let Some(found) = first_audio(&group.children) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Recompute every index path from tree position
pub fn renumber(items: &mut [Item], parent: &[usize]) {
    for (i, item) in items.iter_mut().enumerate() {
        let mut index = parent.to_vec();
        index.push(i);
        if let Item::Group(group) = item {
            renumber(&mut group.children, &index);
        }
        item.set_index(index);
    }
}

/// Index path of the sibling immediately after `index`
pub fn next_sibling_index(index: &[usize]) -> Option<Vec<usize>> {
    let (last, _) = index.split_last()?;
    let mut next = index.to_vec();
    *next.last_mut()? = last + 1;
    Some(next)
}
