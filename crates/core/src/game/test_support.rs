//! Shared fixtures for the `game` test suite.
//! This module exists to avoid repeating session and item setup across many tests.
//! It does not own production gameplay logic.

use super::*;
use crate::content::keys;

pub(super) fn game(seed: u64) -> Game {
    Game::new(seed, GameConfig::default(), ContentPack::default()).expect("default config is valid")
}

/// A session with empty grids, an empty shop, and an empty journal.
pub(super) fn bare_game() -> Game {
    let mut game = game(7);
    game.state = GameState::empty(&game.config);
    game.log.clear();
    game
}

pub(super) fn give(game: &mut Game, template: &str, owner: Owner, anchor: usize) -> ItemId {
    let item = game.content.create_instance(template, Owner::Shop, &mut game.ids).expect("known");
    let id = item.id;
    let key = game.state.items.insert(item);
    let (grid, items) = game.state.grid_and_items_mut(owner).expect("grid owner");
    grid.commit(items, key, anchor).expect("fixture placement fits");
    id
}

pub(super) fn offer(game: &mut Game, template: &str) -> ItemId {
    let item = game.content.create_instance(template, Owner::Shop, &mut game.ids).expect("known");
    let id = item.id;
    let key = game.state.items.insert(item);
    game.state.shop.push(key);
    id
}

/// Fills every cell of `owner` with single-cell items.
pub(super) fn fill(game: &mut Game, owner: Owner) {
    let cells = game.state.grid(owner).map_or(0, |grid| grid.len());
    for anchor in 0..cells {
        give(game, keys::KNIFE, owner, anchor);
    }
}

/// Starts a battle at 0 and ticks every `step` ms until it ends.
pub(super) fn fight(game: &mut Game, step: Millis) -> Winner {
    game.start_battle(0).expect("idle game starts a battle");
    let mut now = 0;
    for _ in 0..10_000 {
        now += step;
        if let Some(winner) = game.tick(now).expect("battle is running").outcome {
            return winner;
        }
    }
    panic!("battle did not end within 10000 ticks");
}
