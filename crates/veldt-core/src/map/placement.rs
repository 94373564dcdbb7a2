//! Wall-free placement validation and relocation search.

use glam::Vec2;
use quadrille::Aabb;

use crate::map::Map;

/// How far beyond a rejected box the relocation search looks for walls to
/// slide along, in world units.
pub const PLACEMENT_SEARCH_PADDING: f32 = 128.0;

/// Outcome of a placement query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The requested box is already valid.
    Valid,
    /// The requested box was blocked; this nearby position is free.
    Relocated(Vec2),
    /// No free position was found near the requested box.
    NotFound,
}

impl Map {
    /// Whether a box is inside the map and free of walls.
    #[must_use]
    pub fn is_valid_placement(&self, rect: &Aabb) -> bool {
        self.is_in_boundaries(rect) && !self.spatial().any_wall_in_rect(rect)
    }

    /// Finds somewhere to put a box of `rect`'s size at or near `rect`.
    ///
    /// If the requested box is free, it is used as-is. Otherwise each wall
    /// within [`PLACEMENT_SEARCH_PADDING`] of the box contributes twelve
    /// candidate positions flush against its edges and corners, offset by
    /// one unit so the candidate does not touch the wall, and the valid
    /// candidate closest to the requested position wins.
    #[must_use]
    pub fn find_valid_placement(&self, rect: &Aabb) -> Placement {
        if self.is_valid_placement(rect) {
            return Placement::Valid;
        }
        let size = rect.size();
        let search = rect.expanded(PLACEMENT_SEARCH_PADDING);
        let mut best: Option<(Vec2, f32)> = None;
        for wall_id in self.spatial().walls_in_rect(&search) {
            let Some(wall) = self.spatial().aabb_of(wall_id) else {
                continue;
            };
            for candidate in positions_around(&wall, rect) {
                if !self.is_valid_placement(&Aabb::from_min_size(candidate, size)) {
                    continue;
                }
                let dist = candidate.distance_squared(rect.min);
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((candidate, dist));
                }
            }
        }
        match best {
            Some((position, _)) => Placement::Relocated(position),
            None => Placement::NotFound,
        }
    }
}

/// The twelve candidate positions around a wall for a box the size of
/// `rect`: above, below, left, and right of the wall keeping the box's own
/// coordinate on the free axis, plus the same four sides aligned to each
/// end of the wall.
fn positions_around(wall: &Aabb, rect: &Aabb) -> [Vec2; 12] {
    let size = rect.size();
    let above = wall.min.y - size.y - 1.0;
    let below = wall.max.y + 1.0;
    let left = wall.min.x - size.x - 1.0;
    let right = wall.max.x + 1.0;
    [
        // Edge-aligned: keep the box's own x or y.
        Vec2::new(rect.min.x, above),
        Vec2::new(rect.min.x, below),
        Vec2::new(left, rect.min.y),
        Vec2::new(right, rect.min.y),
        // Corner-aligned along the top and bottom edges.
        Vec2::new(wall.min.x, above),
        Vec2::new(wall.max.x - size.x, above),
        Vec2::new(wall.min.x, below),
        Vec2::new(wall.max.x - size.x, below),
        // Corner-aligned along the left and right edges.
        Vec2::new(left, wall.min.y),
        Vec2::new(left, wall.max.y - size.y),
        Vec2::new(right, wall.min.y),
        Vec2::new(right, wall.max.y - size.y),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_candidates_surround_the_wall() {
        let wall = Aabb::from_min_size(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0));
        let rect = Aabb::from_min_size(Vec2::new(110.0, 110.0), Vec2::new(20.0, 20.0));
        let candidates = positions_around(&wall, &rect);
        assert_eq!(candidates.len(), 12);
        for c in candidates {
            let placed = Aabb::from_min_size(c, rect.size());
            assert!(
                !placed.intersects(&wall),
                "candidate {c:?} overlaps the wall"
            );
        }
    }
}
