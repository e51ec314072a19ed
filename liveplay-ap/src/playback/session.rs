//! Active playback session
//!
//! Owns the two runtime registries: active cues and active groups, both
//! keyed by item UUID. Only the engine holds a `Session` mutably; the
//! ducking coordinator and group sequencer receive it by reference.

use std::collections::HashMap;
use uuid::Uuid;

use super::transport::TransportId;
use super::types::{ActiveCue, ActiveGroup, EngineSnapshot, MasterLevel};

#[derive(Debug, Default)]
pub struct Session {
    cues: HashMap<Uuid, ActiveCue>,
    groups: HashMap<Uuid, ActiveGroup>,
    next_start_seq: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number for the next cue to start
    pub fn next_start_seq(&mut self) -> u64 {
        let seq = self.next_start_seq;
        self.next_start_seq += 1;
        seq
    }

    // ------------------------------------------------------------------
    // Cues
    // ------------------------------------------------------------------

    pub fn contains_cue(&self, uuid: Uuid) -> bool {
        self.cues.contains_key(&uuid)
    }

    pub fn cue(&self, uuid: Uuid) -> Option<&ActiveCue> {
        self.cues.get(&uuid)
    }

    pub fn cue_mut(&mut self, uuid: Uuid) -> Option<&mut ActiveCue> {
        self.cues.get_mut(&uuid)
    }

    pub fn insert_cue(&mut self, cue: ActiveCue) {
        self.cues.insert(cue.uuid, cue);
    }

    pub fn remove_cue(&mut self, uuid: Uuid) -> Option<ActiveCue> {
        self.cues.remove(&uuid)
    }

    pub fn cue_count(&self) -> usize {
        self.cues.len()
    }

    /// Active cue UUIDs in start order
    pub fn cue_ids(&self) -> Vec<Uuid> {
        let mut cues: Vec<&ActiveCue> = self.cues.values().collect();
        cues.sort_by_key(|c| c.start_seq);
        cues.into_iter().map(|c| c.uuid).collect()
    }

    pub fn cues(&self) -> impl Iterator<Item = &ActiveCue> {
        self.cues.values()
    }

    pub fn cue_by_transport(&self, id: TransportId) -> Option<Uuid> {
        self.cues
            .values()
            .find(|c| c.transport == id)
            .map(|c| c.uuid)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub fn group(&self, uuid: Uuid) -> Option<&ActiveGroup> {
        self.groups.get(&uuid)
    }

    pub fn group_mut(&mut self, uuid: Uuid) -> Option<&mut ActiveGroup> {
        self.groups.get_mut(&uuid)
    }

    pub fn insert_group(&mut self, group: ActiveGroup) {
        self.groups.insert(group.uuid, group);
    }

    pub fn remove_group(&mut self, uuid: Uuid) -> Option<ActiveGroup> {
        self.groups.remove(&uuid)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Tracked group UUIDs, sorted
    pub fn group_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.groups.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Tracked groups whose chain contains `item`, sorted by UUID
    pub fn groups_containing(&self, item: Uuid) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .groups
            .values()
            .filter(|g| g.playback_chain.contains(&item))
            .map(|g| g.uuid)
            .collect();
        ids.sort();
        ids
    }

    /// Whether any member of the group's chain is still an active cue
    pub fn chain_has_active_member(&self, group: Uuid) -> bool {
        self.groups
            .get(&group)
            .map(|g| g.playback_chain.iter().any(|u| self.cues.contains_key(u)))
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.cues.clear();
        self.groups.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty() && self.groups.is_empty()
    }

    pub fn snapshot(&self, master: MasterLevel, panic_pending: bool) -> EngineSnapshot {
        let mut active_cues: Vec<ActiveCue> = self.cues.values().cloned().collect();
        active_cues.sort_by_key(|c| c.start_seq);
        let mut active_groups: Vec<ActiveGroup> = self.groups.values().cloned().collect();
        active_groups.sort_by(|a, b| a.index.cmp(&b.index));
        EngineSnapshot {
            active_cues,
            active_groups,
            master,
            panic_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveplay_common::model::AudioItem;

    fn cue(session: &mut Session, name: &str, voice: u64) -> Uuid {
        let item = AudioItem::new(name, 4.0);
        let seq = session.next_start_seq();
        session.insert_cue(ActiveCue::new(&item, TransportId(voice), seq));
        item.uuid
    }

    #[test]
    fn test_cue_ids_follow_start_order() {
        let mut session = Session::new();
        let a = cue(&mut session, "a", 1);
        let b = cue(&mut session, "b", 2);
        let c = cue(&mut session, "c", 3);
        assert_eq!(session.cue_ids(), vec![a, b, c]);

        session.remove_cue(b);
        assert_eq!(session.cue_ids(), vec![a, c]);
        assert_eq!(session.cue_by_transport(TransportId(3)), Some(c));
        assert_eq!(session.cue_by_transport(TransportId(2)), None);
    }

    #[test]
    fn test_clear_empties_both_maps() {
        let mut session = Session::new();
        cue(&mut session, "a", 1);
        assert!(!session.is_empty());
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.snapshot(MasterLevel::default(), false).active_cues.len(), 0);
    }
}
