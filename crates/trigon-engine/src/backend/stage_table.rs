use slotmap::SlotMap;

use super::StageId;

/// Shader stages with deferred release.
///
/// A stage stays alive while any program uses it, even after its release has
/// been requested. The slot is reclaimed when both conditions hold: release
/// requested and no users left. Keys are generation-checked, so a reclaimed
/// id never resolves to a later stage.
#[derive(Debug)]
pub struct StageTable<T> {
    slots: SlotMap<StageId, StageSlot<T>>,
}

#[derive(Debug)]
struct StageSlot<T> {
    value: T,
    users: u32,
    release_requested: bool,
}

impl<T> StageTable<T> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, value: T) -> StageId {
        self.slots.insert(StageSlot {
            value,
            users: 0,
            release_requested: false,
        })
    }

    pub fn get(&self, id: StageId) -> Option<&T> {
        self.slots.get(id).map(|s| &s.value)
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.slots.contains_key(id)
    }

    /// Number of stages not yet reclaimed.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_release_requested(&self, id: StageId) -> bool {
        self.slots.get(id).is_some_and(|s| s.release_requested)
    }

    /// Registers one more program using `id`. Returns `false` for unknown ids.
    pub fn retain(&mut self, id: StageId) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.users += 1;
                true
            }
            None => false,
        }
    }

    /// Drops one program's use of `id`.
    ///
    /// Returns the stage if this reclaimed it.
    pub fn unretain(&mut self, id: StageId) -> Option<T> {
        let slot = self.slots.get_mut(id)?;
        slot.users = slot.users.saturating_sub(1);
        self.reclaim_if_unused(id)
    }

    /// Requests release of `id`.
    ///
    /// Returns the stage if nothing uses it and it was reclaimed right away.
    pub fn request_release(&mut self, id: StageId) -> Option<T> {
        let slot = self.slots.get_mut(id)?;
        slot.release_requested = true;
        self.reclaim_if_unused(id)
    }

    fn reclaim_if_unused(&mut self, id: StageId) -> Option<T> {
        let slot = self.slots.get(id)?;
        if slot.release_requested && slot.users == 0 {
            self.slots.remove(id).map(|s| s.value)
        } else {
            None
        }
    }
}

impl<T> Default for StageTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_stage_is_reclaimed_on_release() {
        let mut table = StageTable::new();
        let id = table.insert("vs");

        assert_eq!(table.request_release(id), Some("vs"));
        assert!(!table.contains(id));
        assert!(table.is_empty());
    }

    #[test]
    fn used_stage_outlives_release_request() {
        let mut table = StageTable::new();
        let id = table.insert("vs");
        assert!(table.retain(id));

        assert_eq!(table.request_release(id), None);
        assert!(table.contains(id));
        assert!(table.is_release_requested(id));
        assert_eq!(table.get(id), Some(&"vs"));

        assert_eq!(table.unretain(id), Some("vs"));
        assert!(!table.contains(id));
    }

    #[test]
    fn stage_without_release_request_survives_last_user() {
        let mut table = StageTable::new();
        let id = table.insert("fs");
        table.retain(id);

        assert_eq!(table.unretain(id), None);
        assert!(table.contains(id));
    }

    #[test]
    fn shared_stage_waits_for_every_user() {
        let mut table = StageTable::new();
        let id = table.insert("vs");
        table.retain(id);
        table.retain(id);
        table.request_release(id);

        assert_eq!(table.unretain(id), None);
        assert_eq!(table.unretain(id), Some("vs"));
    }

    #[test]
    fn stale_id_does_not_alias_new_stage() {
        let mut table = StageTable::new();
        let old = table.insert("old");
        table.request_release(old);
        let new = table.insert("new");

        assert_ne!(old, new);
        assert_eq!(table.get(old), None);
        assert!(!table.retain(old));
        assert_eq!(table.request_release(old), None);
        assert_eq!(table.get(new), Some(&"new"));
    }
}
