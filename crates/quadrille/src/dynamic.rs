//! Grid index for occupants that move.
//!
//! [`DynamicGrid`] keeps two structures in sync: a master `HashMap` from key
//! to last-reported box, and the per-cell key lists derived from those boxes.
//! Callers mutate positions elsewhere and then report the new box through
//! [`DynamicGrid::update`]; the grid only re-files cell membership when the
//! move actually crossed a cell boundary.
//!
//! # Note on `HashMap` usage
//!
//! The master map is only ever used for keyed lookups, never iterated in a
//! way that feeds simulation state, so its nondeterministic iteration order
//! is harmless. Query results are gathered from cell lists, whose order is
//! insertion order.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use glam::Vec2;
use tracing::debug;

use crate::grid::CellSpace;
use crate::query::SpatialQuery;
use crate::Aabb;

/// Spatial index over moving occupants, keyed by an opaque `K`.
#[derive(Debug, Clone)]
pub struct DynamicGrid<K> {
    /// Last-reported box per occupant. Authoritative for query filtering.
    entries: HashMap<K, Aabb>,
    /// Keys filed under each cell their box overlaps.
    cells: Vec<Vec<K>>,
    space: CellSpace,
    area: Vec2,
}

impl<K> DynamicGrid<K>
where
    K: Copy + Eq + Hash,
{
    /// Create an empty grid covering `area` (world pixels).
    #[must_use]
    pub fn new(area: Vec2) -> Self {
        let space = CellSpace::new(area);
        Self {
            entries: HashMap::new(),
            cells: vec![Vec::new(); space.cell_count()],
            space,
            area,
        }
    }

    /// The world area this grid covers.
    #[must_use]
    pub fn area(&self) -> Vec2 {
        self.area
    }

    /// Insert an occupant, filing it into every cell its box overlaps.
    ///
    /// Permissive: inserting a key that is already present is a no-op and
    /// returns `false`. Callers that treat a duplicate add as a programming
    /// error enforce that at their own layer.
    pub fn insert(&mut self, key: K, aabb: Aabb) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, aabb);
        self.file_into_cells(key, &aabb);
        true
    }

    /// Remove an occupant from the index.
    ///
    /// Removal is deliberately more defensive than insertion: after clearing
    /// the cells implied by the last-reported box, any miss triggers a full
    /// scan of every cell so a stale reference can never leak. A miss means
    /// the box was mutated without a matching [`update`](Self::update) call.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(aabb) = self.entries.remove(key) else {
            return false;
        };

        let mut missed = false;
        for idx in self.space.indices(self.space.range(&aabb)) {
            if let Some(pos) = self.cells[idx].iter().position(|k| k == key) {
                self.cells[idx].swap_remove(pos);
            } else {
                missed = true;
            }
        }

        if missed {
            debug!("occupant missing from an expected cell on removal; scanning all cells");
            for cell in &mut self.cells {
                cell.retain(|k| k != key);
            }
        }

        true
    }

    /// Report an occupant's new box after a move or resize.
    ///
    /// If the old and new boxes cover the same cell range, only the master
    /// record is refreshed; sub-cell moves, the overwhelmingly common case,
    /// never touch the cell lists. Otherwise the occupant is removed from
    /// the cells implied by its old box and re-filed under the new one.
    /// Comparing the full range (not just the minimum cell) keeps resizes
    /// that cross a boundary on the max side from leaving membership stale.
    ///
    /// Returns `false` (and does nothing) if the key is not in the index.
    pub fn update(&mut self, key: K, new_aabb: Aabb) -> bool {
        let Some(old) = self.entries.get_mut(&key) else {
            return false;
        };
        let old_aabb = *old;
        *old = new_aabb;

        if self.space.range(&old_aabb) == self.space.range(&new_aabb) {
            return true;
        }

        for idx in self.space.indices(self.space.range(&old_aabb)) {
            if let Some(pos) = self.cells[idx].iter().position(|k| *k == key) {
                self.cells[idx].swap_remove(pos);
            }
        }
        self.file_into_cells(key, &new_aabb);
        true
    }

    /// Check membership. O(1) through the master record; in debug builds the
    /// cell lists are cross-checked, since a key recorded in the master map
    /// but absent from its implied cells indicates an index bug.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        match self.entries.get(key) {
            Some(aabb) => {
                debug_assert!(
                    self.space
                        .indices(self.space.range(aabb))
                        .any(|idx| self.cells[idx].contains(key)),
                    "occupant recorded but absent from its implied cells"
                );
                true
            }
            None => {
                // Consistency check: the key must not linger in any cell.
                debug_assert!(
                    !self.cells.iter().any(|c| c.contains(key)),
                    "occupant absent from the master record but still filed in a cell"
                );
                false
            }
        }
    }

    /// Number of occupants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the grid holds no occupants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all occupants and their last-reported boxes.
    pub fn iter(&self) -> impl Iterator<Item = (K, Aabb)> + '_ {
        self.entries.iter().map(|(k, a)| (*k, *a))
    }

    /// Rebuild the cell array for a new covered area, re-filing every
    /// occupant. Used when the map is resized.
    pub fn resize(&mut self, area: Vec2) {
        self.space = CellSpace::new(area);
        self.area = area;
        self.cells = vec![Vec::new(); self.space.cell_count()];
        // Borrow dance: collect before re-filing.
        let entries: Vec<(K, Aabb)> = self.entries.iter().map(|(k, a)| (*k, *a)).collect();
        for (key, aabb) in entries {
            self.file_into_cells(key, &aabb);
        }
    }

    fn file_into_cells(&mut self, key: K, aabb: &Aabb) {
        for idx in self.space.indices(self.space.range(aabb)) {
            if !self.cells[idx].contains(&key) {
                self.cells[idx].push(key);
            }
        }
    }
}

impl<K> SpatialQuery<K> for DynamicGrid<K>
where
    K: Copy + Eq + Hash,
{
    fn aabb_of(&self, key: &K) -> Option<Aabb> {
        self.entries.get(key).copied()
    }

    fn query_point_where<F>(&self, p: Vec2, pred: F) -> Vec<K>
    where
        F: Fn(&K, &Aabb) -> bool,
    {
        // A point resolves to exactly one cell, so no deduplication needed.
        let cell = &self.cells[self.space.point_index(p)];
        cell.iter()
            .filter(|k| {
                let aabb = &self.entries[k];
                aabb.contains_point(p) && pred(k, aabb)
            })
            .copied()
            .collect()
    }

    fn query_rect_where<F>(&self, rect: &Aabb, pred: F) -> Vec<K>
    where
        F: Fn(&K, &Aabb) -> bool,
    {
        let mut seen: HashSet<K> = HashSet::new();
        let mut out = Vec::new();
        for idx in self.space.indices(self.space.range(rect)) {
            for key in &self.cells[idx] {
                if seen.contains(key) {
                    continue;
                }
                // Cell overlap is a superset; filter to true box hits.
                let aabb = &self.entries[key];
                if aabb.intersects(rect) && pred(key, aabb) {
                    seen.insert(*key);
                    out.push(*key);
                }
            }
        }
        out
    }

    fn any_at_point_where<F>(&self, p: Vec2, pred: F) -> bool
    where
        F: Fn(&K, &Aabb) -> bool,
    {
        let cell = &self.cells[self.space.point_index(p)];
        cell.iter().any(|k| {
            let aabb = &self.entries[k];
            aabb.contains_point(p) && pred(k, aabb)
        })
    }

    fn any_in_rect_where<F>(&self, rect: &Aabb, pred: F) -> bool
    where
        F: Fn(&K, &Aabb) -> bool,
    {
        self.space.indices(self.space.range(rect)).any(|idx| {
            self.cells[idx].iter().any(|k| {
                let aabb = &self.entries[k];
                aabb.intersects(rect) && pred(k, aabb)
            })
        })
    }
}
