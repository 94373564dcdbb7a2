//! Facade over the wall and dynamic entity spatial grids.

use glam::Vec2;
use quadrille::{Aabb, DynamicGrid, SpatialQuery, StaticGrid};

use crate::entity::EntityId;

/// One query surface over both spatial collections of a map.
///
/// Walls sit in a [`StaticGrid`] tuned for build-once membership; dynamic
/// entities sit in a [`DynamicGrid`] tuned for churn. Entity ids are unique
/// across the whole map, so combined queries are a plain concatenation.
#[derive(Debug, Clone)]
pub struct SpatialManager {
    walls: StaticGrid<EntityId>,
    dynamics: DynamicGrid<EntityId>,
}

impl SpatialManager {
    /// Creates empty grids covering `area`.
    #[must_use]
    pub fn new(area: Vec2) -> Self {
        Self {
            walls: StaticGrid::new(area),
            dynamics: DynamicGrid::new(area),
        }
    }

    pub(crate) fn insert_wall(&mut self, id: EntityId, aabb: Aabb) {
        self.walls.insert(id, aabb);
    }

    pub(crate) fn insert_dynamic(&mut self, id: EntityId, aabb: Aabb) {
        self.dynamics.insert(id, aabb);
    }

    /// Removes `id` from whichever grid holds it. Returns whether anything
    /// was removed.
    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        self.dynamics.remove(&id) || self.walls.remove(&id)
    }

    pub(crate) fn update_dynamic(&mut self, id: EntityId, aabb: Aabb) {
        self.dynamics.update(id, aabb);
    }

    pub(crate) fn resize(&mut self, area: Vec2) {
        self.walls.resize(area);
        self.dynamics.resize(area);
    }

    /// Whether either grid tracks `id`.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.dynamics.contains(&id) || self.walls.contains(&id)
    }

    /// Last bounding box reported for `id`, if tracked.
    #[must_use]
    pub fn aabb_of(&self, id: EntityId) -> Option<Aabb> {
        self.dynamics.aabb_of(&id).or_else(|| self.walls.aabb_of(&id))
    }

    /// Walls intersecting `rect`.
    #[must_use]
    pub fn walls_in_rect(&self, rect: &Aabb) -> Vec<EntityId> {
        self.walls.query_rect(rect)
    }

    /// Walls intersecting `rect` that pass `filter`.
    pub fn walls_in_rect_where<F>(&self, rect: &Aabb, filter: F) -> Vec<EntityId>
    where
        F: Fn(&EntityId, &Aabb) -> bool,
    {
        self.walls.query_rect_where(rect, filter)
    }

    /// Whether any wall intersects `rect`.
    #[must_use]
    pub fn any_wall_in_rect(&self, rect: &Aabb) -> bool {
        self.walls.any_in_rect(rect)
    }

    /// Dynamic entities intersecting `rect`.
    #[must_use]
    pub fn dynamics_in_rect(&self, rect: &Aabb) -> Vec<EntityId> {
        self.dynamics.query_rect(rect)
    }

    /// Dynamic entities intersecting `rect` that pass `filter`.
    pub fn dynamics_in_rect_where<F>(&self, rect: &Aabb, filter: F) -> Vec<EntityId>
    where
        F: Fn(&EntityId, &Aabb) -> bool,
    {
        self.dynamics.query_rect_where(rect, filter)
    }

    /// Dynamic entities whose box contains `point`.
    #[must_use]
    pub fn dynamics_at_point(&self, point: Vec2) -> Vec<EntityId> {
        self.dynamics.query_point(point)
    }

    /// Every entity, wall or dynamic, intersecting `rect`.
    #[must_use]
    pub fn all_in_rect(&self, rect: &Aabb) -> Vec<EntityId> {
        let mut out = self.walls.query_rect(rect);
        out.extend(self.dynamics.query_rect(rect));
        out
    }

    /// Every entity whose box contains `point`.
    #[must_use]
    pub fn all_at_point(&self, point: Vec2) -> Vec<EntityId> {
        let mut out = self.walls.query_point(point);
        out.extend(self.dynamics.query_point(point));
        out
    }

    /// Total tracked entities across both grids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.walls.len() + self.dynamics.len()
    }

    /// Whether both grids are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
