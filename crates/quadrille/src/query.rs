//! Shared read surface for the grid implementations.

use glam::Vec2;

use crate::Aabb;

/// Queries answerable by any quadrille index, static or dynamic.
///
/// The `_where` variants accept a predicate over `(key, box)`; the plain
/// variants are provided shorthands with no filter. Results never contain
/// duplicate keys, no matter how many cells a query region spans.
pub trait SpatialQuery<K> {
    /// The box last recorded for `key`, if it is in the index.
    fn aabb_of(&self, key: &K) -> Option<Aabb>;

    /// Keys whose box contains the point and satisfies the predicate.
    fn query_point_where<F>(&self, p: Vec2, pred: F) -> Vec<K>
    where
        F: Fn(&K, &Aabb) -> bool;

    /// Keys whose box intersects the rect and satisfies the predicate.
    fn query_rect_where<F>(&self, rect: &Aabb, pred: F) -> Vec<K>
    where
        F: Fn(&K, &Aabb) -> bool;

    /// Whether any box contains the point and satisfies the predicate.
    /// Short-circuits on the first match.
    fn any_at_point_where<F>(&self, p: Vec2, pred: F) -> bool
    where
        F: Fn(&K, &Aabb) -> bool;

    /// Whether any box intersects the rect and satisfies the predicate.
    /// Short-circuits on the first match.
    fn any_in_rect_where<F>(&self, rect: &Aabb, pred: F) -> bool
    where
        F: Fn(&K, &Aabb) -> bool;

    /// Keys whose box contains the point.
    fn query_point(&self, p: Vec2) -> Vec<K> {
        self.query_point_where(p, |_, _| true)
    }

    /// Keys whose box intersects the rect.
    fn query_rect(&self, rect: &Aabb) -> Vec<K> {
        self.query_rect_where(rect, |_, _| true)
    }

    /// Whether any box contains the point.
    fn any_at_point(&self, p: Vec2) -> bool {
        self.any_at_point_where(p, |_, _| true)
    }

    /// Whether any box intersects the rect.
    fn any_in_rect(&self, rect: &Aabb) -> bool {
        self.any_in_rect_where(rect, |_, _| true)
    }
}
