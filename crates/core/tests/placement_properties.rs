use autobatt_core::{
    ContentPack, GridSize, IdAllocator, ItemCatalog, Items, Owner, PlacementRejection,
    RosterGrid, Shape, try_place,
};
use proptest::prelude::*;

fn mask_strategy() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (1usize..=3, 1usize..=3)
        .prop_flat_map(|(w, h)| prop::collection::vec(prop::collection::vec(any::<bool>(), w), h))
        .prop_filter("mask needs one occupied cell", |rows| rows.iter().flatten().any(|c| *c))
}

fn arena() -> (Items, IdAllocator, ContentPack) {
    (Items::with_key(), IdAllocator::new(), ContentPack::default())
}

fn occupancy_strategy() -> impl Strategy<Value = (usize, usize, Vec<Option<u8>>)> {
    (1usize..=6, 1usize..=5).prop_flat_map(|(columns, rows)| {
        let cells = prop::collection::vec(prop::option::weighted(0.3, Just(1u8)), columns * rows);
        (Just(columns), Just(rows), cells)
    })
}

proptest! {
    #[test]
    fn test_try_place_claims_exactly_the_free_mask_cells(
        (columns, rows, cells) in occupancy_strategy(),
        mask in mask_strategy(),
        anchor_seed in any::<usize>(),
    ) {
        let shape = Shape::masked(mask).expect("filtered mask is valid");
        let anchor = anchor_seed % cells.len();
        let before = cells.clone();

        match try_place(&cells, columns, rows, anchor, &shape) {
            Ok(claimed) => {
                let (row, col) = (anchor / columns, anchor % columns);
                let expected: Vec<usize> =
                    shape.offsets().map(|(y, x)| (row + y) * columns + col + x).collect();
                prop_assert_eq!(&claimed, &expected);
                for (y, x) in shape.offsets() {
                    prop_assert!(row + y < rows && col + x < columns);
                }
                for index in &claimed {
                    prop_assert!(cells[*index].is_none());
                }
            }
            Err(PlacementRejection::Collision { index }) => {
                prop_assert!(cells[index].is_some());
            }
            Err(PlacementRejection::OffGrid { row, col }) => {
                prop_assert!(row >= rows || col >= columns);
            }
            Err(other) => prop_assert!(false, "unexpected rejection {other:?}"),
        }
        prop_assert_eq!(cells, before);
    }

    #[test]
    fn test_first_fit_sequence_keeps_footprints_disjoint(
        masks in prop::collection::vec(mask_strategy(), 1..12),
    ) {
        let (mut items, mut ids, content) = arena();
        let mut grid = RosterGrid::new(Owner::Player, GridSize::new(6, 3));

        for mask in masks {
            let shape = Shape::masked(mask).expect("filtered mask is valid");
            let cells = shape.cell_count();
            let mut item =
                content.create_instance("knife", Owner::Shop, &mut ids).expect("knife exists");
            item.shape = shape;
            let key = items.insert(item);
            let before = grid.clone();
            match grid.first_fit(&mut items, key) {
                Ok(_) => prop_assert_eq!(grid.cells_of(key).len(), cells),
                Err(_) => prop_assert_eq!(&grid, &before),
            }
        }

        let occupied = grid.cells().iter().flatten().count();
        let claimed: usize =
            grid.unique_instances().iter().map(|key| items[*key].shape.cell_count()).sum();
        prop_assert_eq!(occupied, claimed);
    }

    #[test]
    fn test_evict_twice_equals_evict_once(anchor in 0usize..18) {
        let (mut items, mut ids, content) = arena();
        let item = content.create_instance("club", Owner::Shop, &mut ids).expect("club exists");
        let key = items.insert(item);
        let mut grid = RosterGrid::new(Owner::Player, GridSize::new(6, 3));
        prop_assume!(grid.commit(&mut items, key, anchor).is_ok());

        grid.evict(key);
        let once = grid.clone();
        grid.evict(key);
        prop_assert_eq!(grid, once);
    }
}
