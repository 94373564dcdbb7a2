//! Slot table mapping stable per-map indices to dynamic entities.

use std::collections::{BTreeSet, HashMap};

use crate::entity::{EntityId, MapEntityIndex};

/// Arena of dynamic entity slots with lowest-free-slot allocation.
///
/// Freed slots are recycled before the table grows, so a long-lived map
/// keeps its index space compact instead of creeping upward forever.
#[derive(Debug, Default)]
pub(crate) struct DynamicEntityTable {
    slots: Vec<Option<EntityId>>,
    free: BTreeSet<u16>,
    by_id: HashMap<EntityId, MapEntityIndex>,
}

impl DynamicEntityTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Assigns `id` the lowest free slot.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn insert(&mut self, id: EntityId) -> MapEntityIndex {
        let slot = if let Some(&lowest) = self.free.iter().next() {
            self.free.remove(&lowest);
            lowest
        } else {
            let next = self.slots.len() as u16;
            self.slots.push(None);
            next
        };
        self.slots[slot as usize] = Some(id);
        let index = MapEntityIndex::new(slot);
        self.by_id.insert(id, index);
        index
    }

    /// Assigns `id` a specific slot, growing the table as needed. The slot
    /// must be empty.
    pub(crate) fn insert_at(&mut self, id: EntityId, index: MapEntityIndex) {
        let slot = index.as_u16();
        while self.slots.len() <= usize::from(slot) {
            #[allow(clippy::cast_possible_truncation)]
            self.free.insert(self.slots.len() as u16);
            self.slots.push(None);
        }
        debug_assert!(
            self.slots[usize::from(slot)].is_none(),
            "slot {index} is already occupied"
        );
        self.free.remove(&slot);
        self.slots[usize::from(slot)] = Some(id);
        self.by_id.insert(id, index);
    }

    /// Frees the slot held by `id`, returning the index it occupied.
    pub(crate) fn remove_id(&mut self, id: EntityId) -> Option<MapEntityIndex> {
        let index = self.by_id.remove(&id)?;
        self.slots[usize::from(index.as_u16())] = None;
        self.free.insert(index.as_u16());
        Some(index)
    }

    pub(crate) fn get(&self, index: MapEntityIndex) -> Option<EntityId> {
        self.slots.get(usize::from(index.as_u16())).copied().flatten()
    }

    pub(crate) fn index_of(&self, id: EntityId) -> Option<MapEntityIndex> {
        self.by_id.get(&id).copied()
    }

    /// Occupied slots in ascending index order.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (MapEntityIndex, EntityId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, id)| id.map(|id| (MapEntityIndex::new(slot as u16), id)))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}
