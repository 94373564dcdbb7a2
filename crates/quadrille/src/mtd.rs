//! Minimum-translation-distance between bounding boxes.

use glam::Vec2;

use crate::Aabb;

/// Smallest displacement that separates `a` from `b`, or `Vec2::ZERO` when
/// the boxes do not genuinely overlap.
///
/// The displacement is computed along whichever axis has the least overlap
/// and is signed so that adding it to `a`'s position pushes `a` out of `b`.
/// Callers must treat a zero vector as "no collision": sharing a grid cell
/// (or even an edge) does not imply a real intersection.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use quadrille::{mtd, Aabb};
///
/// let wall = Aabb::from_min_size(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0));
/// let body = Aabb::from_min_size(Vec2::new(95.0, 90.0), Vec2::new(20.0, 20.0));
///
/// // Overlap is 15px on x, 10px on y; y is the cheaper separation.
/// assert_eq!(mtd(&body, &wall), Vec2::new(0.0, -10.0));
/// ```
#[must_use]
pub fn mtd(a: &Aabb, b: &Aabb) -> Vec2 {
    if !a.intersects(b) {
        return Vec2::ZERO;
    }

    // Penetration depth toward each of the four sides.
    let left = b.min.x - a.max.x; // negative: push a left
    let right = b.max.x - a.min.x; // positive: push a right
    let up = b.min.y - a.max.y; // negative: push a up
    let down = b.max.y - a.min.y; // positive: push a down

    let x = if -left < right { left } else { right };
    let y = if -up < down { up } else { down };

    if x.abs() < y.abs() {
        Vec2::new(x, 0.0)
    } else {
        Vec2::new(0.0, y)
    }
}
