//! # Quadrille
//!
//! Uniform-grid spatial index for 2D axis-aligned bounding boxes.
//!
//! Quadrille partitions a rectangular world into fixed-size square cells and
//! records, for every occupant, each cell its bounding box overlaps. Queries
//! resolve the overlapped cells and filter the candidates down to true box
//! hits, which keeps query cost proportional to local density rather than
//! total population.
//!
//! Two index flavors cover the two lifetimes occupants have in practice:
//!
//! - [`DynamicGrid`]: occupants move. The grid keeps a master record of each
//!   occupant's last-reported box and re-files cell membership when an update
//!   crosses a cell boundary.
//! - [`StaticGrid`]: occupants never move after insertion (walls, terrain).
//!   Boxes are stored inline in the cells, there is no master record and no
//!   move support, and inserts are cheaper.
//!
//! The index never owns the occupants themselves; it stores opaque keys
//! (entity ids, handles) supplied by the caller. Position changes must be
//! reported explicitly via [`DynamicGrid::update`]; there is no observer
//! wiring, by contract.
//!
//! ## Quick start
//!
//! ```
//! use glam::Vec2;
//! use quadrille::{Aabb, DynamicGrid, SpatialQuery};
//!
//! let mut grid: DynamicGrid<u64> = DynamicGrid::new(Vec2::new(960.0, 960.0));
//! grid.insert(1, Aabb::from_min_size(Vec2::new(100.0, 100.0), Vec2::new(32.0, 32.0)));
//!
//! let hits = grid.query_point(Vec2::new(110.0, 110.0));
//! assert_eq!(hits, vec![1]);
//! ```
//!
//! ## Thread safety
//!
//! None is provided. A grid is owned by exactly one simulation thread; all
//! mutation and queries are synchronous and CPU-bound.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dynamic;
pub mod grid;
pub mod mtd;
pub mod query;
pub mod static_grid;

// Re-exports for convenience
pub use dynamic::DynamicGrid;
pub use grid::CELL_SIZE;
pub use mtd::mtd;
pub use query::SpatialQuery;
pub use static_grid::StaticGrid;

use glam::Vec2;

/// Axis-aligned bounding box in world (pixel) coordinates.
///
/// Boxes are half-open on point containment (`min` inclusive, `max`
/// exclusive) and strict on box intersection: two boxes that merely share an
/// edge do not intersect. This matches the collision semantics the index is
/// queried for: a zero-area contact is not an overlap.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    /// Minimum (top-left) corner.
    pub min: Vec2,
    /// Maximum (bottom-right) corner.
    pub max: Vec2,
}

impl Aabb {
    /// Create a box from its top-left corner and size.
    #[must_use]
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self { min, max: min + size }
    }

    /// Create a box from min/max corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Size of the box.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Check if a point is inside the box (`min` inclusive, `max` exclusive).
    #[must_use]
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Check if two boxes genuinely overlap. Shared edges do not count.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Check if `other` lies entirely within this box.
    #[must_use]
    pub fn contains_aabb(&self, other: &Self) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// This box shifted by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// This box grown by `padding` in every direction.
    #[must_use]
    pub fn expanded(&self, padding: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(padding),
            max: self.max + Vec2::splat(padding),
        }
    }
}
