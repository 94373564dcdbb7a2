//! Grid index for occupants that never move.
//!
//! Walls and other terrain are bulk-loaded once and then queried far more
//! often than they are mutated. [`StaticGrid`] exploits that: `(key, box)`
//! pairs are stored inline in the cells, there is no master record to keep
//! in sync, and there is no move operation at all. Removal exists only for
//! wholesale map edits (resizing, editor deletes) and pays a full scan.

use std::collections::HashSet;
use std::hash::Hash;

use glam::Vec2;

use crate::grid::CellSpace;
use crate::query::SpatialQuery;
use crate::Aabb;

/// Spatial index over immobile occupants, keyed by an opaque `K`.
#[derive(Debug, Clone)]
pub struct StaticGrid<K> {
    /// `(key, box)` pairs filed under each overlapped cell.
    cells: Vec<Vec<(K, Aabb)>>,
    space: CellSpace,
    area: Vec2,
    len: usize,
}

impl<K> StaticGrid<K>
where
    K: Copy + Eq + Hash,
{
    /// Create an empty grid covering `area` (world pixels).
    #[must_use]
    pub fn new(area: Vec2) -> Self {
        let space = CellSpace::new(area);
        Self {
            cells: vec![Vec::new(); space.cell_count()],
            space,
            area,
            len: 0,
        }
    }

    /// The world area this grid covers.
    #[must_use]
    pub fn area(&self) -> Vec2 {
        self.area
    }

    /// Insert an occupant. Permissive: a key already present is a no-op
    /// returning `false`.
    pub fn insert(&mut self, key: K, aabb: Aabb) -> bool {
        // An existing occupant is always findable in the min cell of its box,
        // but a re-insert may carry a different box, so scan outright.
        if self.contains(&key) {
            return false;
        }
        for idx in self.space.indices(self.space.range(&aabb)) {
            self.cells[idx].push((key, aabb));
        }
        self.len += 1;
        true
    }

    /// Remove an occupant. Full scan; static occupants are not expected to
    /// leave outside of map resizes and editor operations.
    pub fn remove(&mut self, key: &K) -> bool {
        let mut found = false;
        for cell in &mut self.cells {
            let before = cell.len();
            cell.retain(|(k, _)| k != key);
            found |= cell.len() != before;
        }
        if found {
            self.len -= 1;
        }
        found
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.cells.iter().any(|c| c.iter().any(|(k, _)| k == key))
    }

    /// Number of occupants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the grid holds no occupants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over all occupants and their boxes, deduplicated.
    pub fn iter(&self) -> impl Iterator<Item = (K, Aabb)> + '_ {
        let mut seen: HashSet<K> = HashSet::new();
        self.cells
            .iter()
            .flatten()
            .filter(move |(k, _)| seen.insert(*k))
            .copied()
    }

    /// Rebuild the cell array for a new covered area, re-filing every
    /// occupant.
    pub fn resize(&mut self, area: Vec2) {
        let occupants: Vec<(K, Aabb)> = self.iter().collect();
        self.space = CellSpace::new(area);
        self.area = area;
        self.cells = vec![Vec::new(); self.space.cell_count()];
        self.len = 0;
        for (key, aabb) in occupants {
            self.insert(key, aabb);
        }
    }
}

impl<K> SpatialQuery<K> for StaticGrid<K>
where
    K: Copy + Eq + Hash,
{
    fn aabb_of(&self, key: &K) -> Option<Aabb> {
        self.cells
            .iter()
            .flatten()
            .find(|(k, _)| k == key)
            .map(|(_, a)| *a)
    }

    fn query_point_where<F>(&self, p: Vec2, pred: F) -> Vec<K>
    where
        F: Fn(&K, &Aabb) -> bool,
    {
        let cell = &self.cells[self.space.point_index(p)];
        cell.iter()
            .filter(|(k, a)| a.contains_point(p) && pred(k, a))
            .map(|(k, _)| *k)
            .collect()
    }

    fn query_rect_where<F>(&self, rect: &Aabb, pred: F) -> Vec<K>
    where
        F: Fn(&K, &Aabb) -> bool,
    {
        let mut seen: HashSet<K> = HashSet::new();
        let mut out = Vec::new();
        for idx in self.space.indices(self.space.range(rect)) {
            for (key, aabb) in &self.cells[idx] {
                if !seen.contains(key) && aabb.intersects(rect) && pred(key, aabb) {
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
        cell.iter().any(|(k, a)| a.contains_point(p) && pred(k, a))
    }

    fn any_in_rect_where<F>(&self, rect: &Aabb, pred: F) -> bool
    where
        F: Fn(&K, &Aabb) -> bool,
    {
        self.space.indices(self.space.range(rect)).any(|idx| {
            self.cells[idx]
                .iter()
                .any(|(k, a)| a.intersects(rect) && pred(k, a))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(x: f32, y: f32, w: f32, h: f32) -> Aabb {
        Aabb::from_min_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn insert_and_query() {
        let mut g: StaticGrid<u32> = StaticGrid::new(Vec2::new(512.0, 512.0));
        assert!(g.insert(1, aabb(100.0, 100.0, 50.0, 50.0)));
        assert_eq!(g.len(), 1);
        assert_eq!(g.query_point(Vec2::new(120.0, 120.0)), vec![1]);
        assert!(g.query_point(Vec2::new(400.0, 400.0)).is_empty());
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut g: StaticGrid<u32> = StaticGrid::new(Vec2::new(512.0, 512.0));
        assert!(g.insert(1, aabb(0.0, 0.0, 10.0, 10.0)));
        assert!(!g.insert(1, aabb(200.0, 200.0, 10.0, 10.0)));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn multi_cell_occupant_deduplicated_in_queries() {
        let mut g: StaticGrid<u32> = StaticGrid::new(Vec2::new(512.0, 512.0));
        g.insert(1, aabb(50.0, 50.0, 300.0, 300.0));
        assert_eq!(g.query_rect(&aabb(0.0, 0.0, 512.0, 512.0)), vec![1]);
        assert_eq!(g.iter().count(), 1);
    }

    #[test]
    fn remove_scans_everything() {
        let mut g: StaticGrid<u32> = StaticGrid::new(Vec2::new(512.0, 512.0));
        g.insert(1, aabb(50.0, 50.0, 300.0, 300.0));
        g.insert(2, aabb(10.0, 10.0, 10.0, 10.0));

        assert!(g.remove(&1));
        assert!(!g.remove(&1));
        assert_eq!(g.len(), 1);
        assert!(g.query_rect(&aabb(0.0, 0.0, 512.0, 512.0)).contains(&2));
        assert!(!g.contains(&1));
    }

    #[test]
    fn resize_refiles_occupants() {
        let mut g: StaticGrid<u32> = StaticGrid::new(Vec2::new(512.0, 512.0));
        g.insert(1, aabb(400.0, 400.0, 50.0, 50.0));
        g.resize(Vec2::new(2048.0, 2048.0));
        assert_eq!(g.len(), 1);
        assert_eq!(g.query_point(Vec2::new(410.0, 410.0)), vec![1]);
    }

    #[test]
    fn predicate_excludes_candidates() {
        let mut g: StaticGrid<u32> = StaticGrid::new(Vec2::new(512.0, 512.0));
        g.insert(1, aabb(0.0, 0.0, 100.0, 100.0));
        g.insert(2, aabb(50.0, 50.0, 100.0, 100.0));

        let hits = g.query_rect_where(&aabb(0.0, 0.0, 200.0, 200.0), |k, _| *k == 2);
        assert_eq!(hits, vec![2]);
        assert!(g.any_in_rect_where(&aabb(0.0, 0.0, 200.0, 200.0), |k, _| *k == 1));
    }
}
