//! Item footprints and the read-only placement test used by every grid.
//! This module exists to keep polyomino geometry free of grid ownership concerns.
//! It does not mutate grids or know about item owners.

use crate::error::{PlacementRejection, ShapeError};

/// Bounding box plus optional occupancy mask, indexed `mask[y][x]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    width: usize,
    height: usize,
    mask: Option<Vec<Vec<bool>>>,
}

impl Shape {
    /// A solid rectangle. Zero dimensions are treated as 1.
    pub fn rect(width: usize, height: usize) -> Self {
        Self { width: width.max(1), height: height.max(1), mask: None }
    }

    /// A masked shape whose bounding box is taken from the mask itself.
    pub fn masked(mask: Vec<Vec<bool>>) -> Result<Self, ShapeError> {
        let height = mask.len();
        let width = mask.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(ShapeError::Empty);
        }
        for (row, cells) in mask.iter().enumerate() {
            if cells.len() != width {
                return Err(ShapeError::Ragged { row, expected: width, found: cells.len() });
            }
        }
        if !mask.iter().flatten().any(|&cell| cell) {
            return Err(ShapeError::NoCells);
        }
        Ok(Self { width, height, mask: Some(mask) })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mask(&self) -> Option<&[Vec<bool>]> {
        self.mask.as_deref()
    }

    /// Whether offset `(y, x)` inside the bounding box has a physical cell.
    pub fn occupies(&self, y: usize, x: usize) -> bool {
        if y >= self.height || x >= self.width {
            return false;
        }
        match &self.mask {
            None => true,
            Some(mask) => mask.get(y).and_then(|row| row.get(x)).copied().unwrap_or(false),
        }
    }

    /// Occupied offsets in row-major order.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (y, x)))
            .filter(move |&(y, x)| self.occupies(y, x))
    }

    pub fn cell_count(&self) -> usize {
        self.offsets().count()
    }

    /// The first occupied offset in row-major order. Its absolute cell is the
    /// lowest index of any placed footprint.
    pub fn lead_offset(&self) -> (usize, usize) {
        self.offsets().next().unwrap_or((0, 0))
    }
}

/// Tests whether `shape` fits at `anchor` and returns the absolute cells it
/// would occupy. Fails on the first off-grid or occupied cell.
pub fn try_place<T>(
    cells: &[Option<T>],
    columns: usize,
    rows: usize,
    anchor: usize,
    shape: &Shape,
) -> Result<Vec<usize>, PlacementRejection> {
    if columns == 0 {
        return Err(PlacementRejection::OffGrid { row: 0, col: 0 });
    }
    let anchor_row = anchor / columns;
    let anchor_col = anchor % columns;
    let mut claimed = Vec::with_capacity(shape.width * shape.height);

    for (y, x) in shape.offsets() {
        let row = anchor_row + y;
        let col = anchor_col + x;
        if col >= columns || row >= rows {
            return Err(PlacementRejection::OffGrid { row, col });
        }
        let index = row * columns + col;
        match cells.get(index) {
            Some(None) => claimed.push(index),
            Some(Some(_)) => return Err(PlacementRejection::Collision { index }),
            None => return Err(PlacementRejection::OffGrid { row, col }),
        }
    }

    Ok(claimed)
}
