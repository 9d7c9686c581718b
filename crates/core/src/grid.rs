//! Fixed-size item grids built on the placement test in `shape`.
//! This module exists to keep cell bookkeeping (commit, evict, first-fit) in one place.
//! It does not own the item arena or decide which grid an item should go to.

use std::collections::BTreeSet;

use crate::config::GridSize;
use crate::error::{GameError, PlacementRejection};
use crate::shape::{Shape, try_place};
use crate::state::Items;
use crate::types::{ItemKey, Owner};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterGrid {
    owner: Owner,
    columns: usize,
    rows: usize,
    cells: Vec<Option<ItemKey>>,
}

impl RosterGrid {
    pub fn new(owner: Owner, size: GridSize) -> Self {
        let columns = size.columns.max(1);
        let rows = size.rows.max(1);
        Self { owner, columns, rows, cells: vec![None; columns * rows] }
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn cells(&self) -> &[Option<ItemKey>] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<ItemKey> {
        self.cells.get(index).copied().flatten()
    }

    /// Read-only placement test against the current occupancy.
    pub fn fit(&self, anchor: usize, shape: &Shape) -> Result<Vec<usize>, PlacementRejection> {
        try_place(&self.cells, self.columns, self.rows, anchor, shape)
    }

    /// Places `key` with its shape anchored at `anchor` and tags it with this
    /// grid's owner. Leaves the grid untouched on rejection.
    pub fn commit(
        &mut self,
        items: &mut Items,
        key: ItemKey,
        anchor: usize,
    ) -> Result<Vec<usize>, GameError> {
        if self.contains(key) {
            return Err(PlacementRejection::AlreadyPlaced.into());
        }
        let item = items.get_mut(key).ok_or(GameError::StaleHandle)?;
        let claimed = self.fit(anchor, &item.shape)?;
        self.occupy(key, &claimed);
        item.owner = self.owner;
        tracing::debug!(item = %item.id, grid = %self.owner, anchor, "item placed");
        Ok(claimed)
    }

    /// Commits at the lowest anchor index that fits and returns that anchor.
    pub fn first_fit(&mut self, items: &mut Items, key: ItemKey) -> Result<usize, GameError> {
        if self.contains(key) {
            return Err(PlacementRejection::AlreadyPlaced.into());
        }
        let shape = &items.get(key).ok_or(GameError::StaleHandle)?.shape;
        let anchor = self.find_fit(shape).ok_or(PlacementRejection::NoFreePosition)?;
        self.commit(items, key, anchor)?;
        Ok(anchor)
    }

    /// The lowest anchor where `shape` would fit, without placing anything.
    pub fn find_fit(&self, shape: &Shape) -> Option<usize> {
        (0..self.cells.len()).find(|&anchor| self.fit(anchor, shape).is_ok())
    }

    /// Clears every cell holding `key`. Returns how many cells were cleared.
    pub fn evict(&mut self, key: ItemKey) -> usize {
        let mut cleared = 0;
        for cell in &mut self.cells {
            if *cell == Some(key) {
                *cell = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// Distinct items in order of their first cell.
    pub fn unique_instances(&self) -> Vec<ItemKey> {
        let mut seen = BTreeSet::new();
        self.cells.iter().flatten().copied().filter(|key| seen.insert(*key)).collect()
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.cells.contains(&Some(key))
    }

    pub fn cells_of(&self, key: ItemKey) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Some(key))
            .map(|(index, _)| index)
            .collect()
    }

    /// The anchor `key` was committed at, derived from its lowest cell and the
    /// shape's first occupied offset.
    pub fn anchor_of(&self, shape: &Shape, key: ItemKey) -> Option<usize> {
        let lowest = self.cells.iter().position(|cell| *cell == Some(key))?;
        self.anchor_for_lowest_cell(shape, lowest)
    }

    pub(crate) fn anchor_for_lowest_cell(&self, shape: &Shape, lowest: usize) -> Option<usize> {
        let (lead_y, lead_x) = shape.lead_offset();
        let row = (lowest / self.columns).checked_sub(lead_y)?;
        let col = (lowest % self.columns).checked_sub(lead_x)?;
        Some(row * self.columns + col)
    }

    /// Writes `key` into exactly `cells`. Callers guarantee the cells form a
    /// valid footprint that is currently free.
    pub(crate) fn occupy(&mut self, key: ItemKey, cells: &[usize]) {
        for &index in cells {
            self.cells[index] = Some(key);
        }
    }

    /// Empties the grid and returns the distinct items it held.
    pub fn clear(&mut self) -> Vec<ItemKey> {
        let removed = self.unique_instances();
        self.cells.fill(None);
        removed
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::ids::IdAllocator;
    use crate::state::test_item;

    fn grid(columns: usize, rows: usize) -> RosterGrid {
        RosterGrid::new(Owner::Player, GridSize { columns, rows })
    }

    #[test]
    fn commit_writes_one_handle_into_every_cell_and_retags_owner() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let key = items.insert(test_item(&mut ids, Shape::rect(2, 2), Owner::Shop));
        let mut grid = grid(4, 3);

        let cells = grid.commit(&mut items, key, 5).expect("fits");
        assert_eq!(cells, vec![5, 6, 9, 10]);
        assert_eq!(grid.cells_of(key), cells);
        assert_eq!(items[key].owner, Owner::Player);
        assert_eq!(grid.unique_instances(), vec![key]);
        assert_eq!(grid.anchor_of(&items[key].shape, key), Some(5));
    }

    #[test]
    fn rejected_commit_leaves_grid_and_owner_untouched() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let blocker = items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        let wide = items.insert(test_item(&mut ids, Shape::rect(3, 1), Owner::Shop));
        let mut grid = grid(3, 1);
        grid.commit(&mut items, blocker, 1).expect("blocker fits");
        let before = grid.clone();

        let err = grid.commit(&mut items, wide, 0).expect_err("collides");
        assert_eq!(err, GameError::PlacementRejected(PlacementRejection::Collision { index: 1 }));
        assert_eq!(grid, before);
        assert_eq!(items[wide].owner, Owner::Shop);
    }

    #[test]
    fn first_fit_scans_row_major() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let tall = items.insert(test_item(&mut ids, Shape::rect(1, 2), Owner::Shop));
        let small = items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        let wide = items.insert(test_item(&mut ids, Shape::rect(2, 1), Owner::Shop));
        let mut grid = grid(3, 2);

        assert_eq!(grid.first_fit(&mut items, tall), Ok(0));
        assert_eq!(grid.first_fit(&mut items, small), Ok(1));
        // Anchors 0..=3 are blocked or run off the row for a 2x1 item.
        assert_eq!(grid.first_fit(&mut items, wide), Ok(4));
        let expected = [Some(tall), Some(small), None, Some(tall), Some(wide), Some(wide)];
        assert_eq!(grid.cells(), &expected);
    }

    #[test]
    fn first_fit_on_full_grid_reports_no_free_position() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let filler = items.insert(test_item(&mut ids, Shape::rect(2, 1), Owner::Shop));
        let extra = items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        let mut grid = grid(2, 1);
        grid.first_fit(&mut items, filler).expect("fills grid");

        let err = grid.first_fit(&mut items, extra).expect_err("full");
        assert_eq!(err, GameError::PlacementRejected(PlacementRejection::NoFreePosition));
        assert!(!grid.contains(extra));
    }

    #[test]
    fn evict_is_idempotent() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let key = items.insert(test_item(&mut ids, Shape::rect(2, 1), Owner::Shop));
        let mut grid = grid(3, 1);
        grid.commit(&mut items, key, 0).expect("fits");

        assert_eq!(grid.evict(key), 2);
        let after_first = grid.clone();
        assert_eq!(grid.evict(key), 0);
        assert_eq!(grid, after_first);
        assert!(grid.is_empty());
    }

    #[test]
    fn l_shape_leaves_its_gap_free_for_neighbours() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let l_shape = Shape::masked(vec![vec![true, false], vec![true, true]]).expect("mask");
        let ell = items.insert(test_item(&mut ids, l_shape, Owner::Shop));
        let gem = items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        let mut grid = grid(2, 2);

        assert_eq!(grid.commit(&mut items, ell, 0), Ok(vec![0, 2, 3]));
        assert_eq!(grid.first_fit(&mut items, gem), Ok(1));
        assert_eq!(grid.unique_instances(), vec![ell, gem]);
    }

    #[test]
    fn recommitting_a_placed_item_is_rejected() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let key = items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        let mut grid = grid(2, 1);
        grid.commit(&mut items, key, 0).expect("fits");
        assert_eq!(
            grid.commit(&mut items, key, 1),
            Err(GameError::PlacementRejected(PlacementRejection::AlreadyPlaced))
        );
        assert_eq!(grid.cells_of(key), vec![0]);
    }

    #[test]
    fn anchor_of_masked_shape_with_empty_corner() {
        let mut items: Items = SlotMap::with_key();
        let mut ids = IdAllocator::new();
        let hook = Shape::masked(vec![vec![false, true], vec![true, true]]).expect("mask");
        let key = items.insert(test_item(&mut ids, hook, Owner::Shop));
        let mut grid = grid(3, 3);
        assert_eq!(grid.commit(&mut items, key, 3), Ok(vec![4, 6, 7]));
        assert_eq!(grid.anchor_of(&items[key].shape, key), Some(3));
    }
}
