//! Cell-coordinate math shared by the grid implementations.
//!
//! A [`CellSpace`] maps world coordinates onto a fixed-size array of square
//! cells covering the indexed area. All mappings clamp to the grid bounds, so
//! occupants that transiently sit outside the area (an entity pushed past a
//! map edge before boundary correction runs) still resolve to legal cells
//! instead of panicking.

use glam::Vec2;

use crate::Aabb;

/// Side length of one grid cell, in world pixels.
///
/// Tunable trade-off: smaller cells mean fewer false-positive candidates per
/// query but more cells each occupant has to register into.
pub const CELL_SIZE: f32 = 128.0;

/// Dimensions of a cell array covering a rectangular area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellSpace {
    cols: usize,
    rows: usize,
}

/// Inclusive range of cell coordinates overlapped by a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl CellSpace {
    /// Build a cell space covering `area`. Degenerate areas still get one cell.
    pub fn new(area: Vec2) -> Self {
        let cols = ((area.x / CELL_SIZE).ceil() as usize).max(1);
        let rows = ((area.y / CELL_SIZE).ceil() as usize).max(1);
        Self { cols, rows }
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Clamp world-space cell coordinates into the grid.
    fn clamp(&self, cx: f32, cy: f32) -> (usize, usize) {
        let x = (cx.max(0.0) as usize).min(self.cols - 1);
        let y = (cy.max(0.0) as usize).min(self.rows - 1);
        (x, y)
    }

    /// Cell coordinates of the cell containing `min`, the anchor cell a box
    /// files under.
    pub fn min_cell(&self, min: Vec2) -> (usize, usize) {
        self.clamp((min.x / CELL_SIZE).floor(), (min.y / CELL_SIZE).floor())
    }

    /// Flat index of the cell containing a point (clamped).
    pub fn point_index(&self, p: Vec2) -> usize {
        let (x, y) = self.min_cell(p);
        y * self.cols + x
    }

    /// The clamped, inclusive range of cells a box overlaps.
    pub fn range(&self, aabb: &Aabb) -> CellRange {
        let (x0, y0) = self.min_cell(aabb.min);
        let (x1, y1) = self.clamp(
            (aabb.max.x / CELL_SIZE).floor(),
            (aabb.max.y / CELL_SIZE).floor(),
        );
        CellRange { x0, y0, x1, y1 }
    }

    /// Flat indices of every cell in `range`, row-major.
    pub fn indices(&self, range: CellRange) -> impl Iterator<Item = usize> + '_ {
        let cols = self.cols;
        (range.y0..=range.y1).flat_map(move |y| (range.x0..=range.x1).map(move |x| y * cols + x))
    }
}

impl CellRange {
    /// Number of cells in the range.
    pub fn cell_count(&self) -> usize {
        (self.x1 - self.x0 + 1) * (self.y1 - self.y0 + 1)
    }
}
