//! Scripted rounds driven by a synthetic clock.
//! This module exists to exercise a full session (shop, battle, round end, save) without a UI.
//! It does not own game rules; every action goes through the `Game` facade.

use std::io;

use autobatt_core::{BattlePhase, BlobStore, Game, Millis, Owner, Winner};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoplayReport {
    pub rounds: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub abandoned: u32,
    pub purchases: u32,
}

pub struct Autoplay {
    /// Battles running longer than this are abandoned.
    pub max_battle_ms: Millis,
    clock: Millis,
}

impl Autoplay {
    pub fn new(max_battle_ms: Millis) -> Self {
        Self { max_battle_ms, clock: 0 }
    }

    pub fn clock(&self) -> Millis {
        self.clock
    }

    /// Plays `rounds` rounds, saving after every mutating step.
    pub fn run(
        &mut self,
        game: &mut Game,
        store: &mut dyn BlobStore,
        rounds: u32,
    ) -> io::Result<AutoplayReport> {
        let mut report = AutoplayReport::default();
        if matches!(game.phase(), BattlePhase::Running { .. }) {
            tracing::info!("finishing the battle found in the save");
            self.fight(game, &mut report);
            game.save(store)?;
        }
        for round in 0..rounds {
            report.purchases += shop_greedily(game);
            game.save(store)?;

            game.start_battle(self.clock).map_err(io::Error::other)?;
            self.fight(game, &mut report);
            game.save(store)?;
            tracing::info!(
                round,
                gold = game.gold(),
                roster = game.instances_in(Owner::Player).len(),
                "round finished"
            );
        }
        Ok(report)
    }

    fn fight(&mut self, game: &mut Game, report: &mut AutoplayReport) {
        let started_at = match game.phase() {
            BattlePhase::Running { started_at } => started_at,
            _ => return,
        };
        self.clock = self.clock.max(started_at);
        let step = game.config().tick_ms;
        report.rounds += 1;
        loop {
            self.clock += step;
            let outcome = match game.tick(self.clock) {
                Ok(tick) => tick.outcome,
                Err(err) => {
                    tracing::warn!(%err, "tick rejected");
                    return;
                }
            };
            match outcome {
                Some(Winner::Player) => report.wins += 1,
                Some(Winner::Enemy) => report.losses += 1,
                Some(Winner::Draw) => report.draws += 1,
                None if self.clock - started_at >= self.max_battle_ms => {
                    if game.abandon_battle().is_ok() {
                        report.abandoned += 1;
                    }
                }
                None => continue,
            }
            return;
        }
    }
}

/// Buys the most expensive affordable offer until nothing more fits the budget or the grids.
fn shop_greedily(game: &mut Game) -> u32 {
    let mut bought = 0;
    loop {
        let gold = game.gold();
        let mut offers: Vec<_> = game
            .instances_in(Owner::Shop)
            .into_iter()
            .filter(|item| item.price <= gold)
            .map(|item| (item.price, item.id))
            .collect();
        offers.sort_unstable_by(|a, b| b.cmp(a));
        let Some(id) = offers.into_iter().find_map(|(_, id)| game.buy(id).ok()) else {
            return bought;
        };
        tracing::debug!(item = %id, "autoplay bought");
        bought += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobatt_core::{ContentPack, GameConfig, MemoryBlobStore};

    fn new_game(seed: u64) -> Game {
        Game::new(seed, GameConfig::default(), ContentPack::default()).unwrap()
    }

    #[test]
    fn test_rounds_are_played_and_saved() {
        let mut game = new_game(21);
        let mut store = MemoryBlobStore::new();
        let report = Autoplay::new(120_000).run(&mut game, &mut store, 3).unwrap();

        assert_eq!(report.rounds, 3);
        assert_eq!(report.wins + report.losses + report.draws + report.abandoned, 3);
        assert_eq!(game.phase(), BattlePhase::Idle);
        assert_eq!(game.state().verify_integrity(), Ok(()));

        let mut loaded = new_game(0);
        loaded.restore(&store.get(&game.config().save_key).unwrap().unwrap()).unwrap();
        assert_eq!(loaded.state().snapshot_hash(), game.state().snapshot_hash());
    }

    #[test]
    fn test_stalled_battles_are_abandoned() {
        let mut game = new_game(4);
        let mut store = MemoryBlobStore::new();
        let mut autoplay = Autoplay::new(500);
        let report = autoplay.run(&mut game, &mut store, 1).unwrap();

        assert_eq!(report.abandoned, 1);
        assert_eq!(game.phase(), BattlePhase::Idle);
        assert_eq!(autoplay.clock(), 600);
    }

    #[test]
    fn test_greedy_shopping_never_overspends() {
        let mut game = new_game(9);
        let before = game.gold();
        let bought = shop_greedily(&mut game);
        assert!(bought > 0);
        assert!(game.gold() <= before);
        assert_eq!(game.state().verify_integrity(), Ok(()));
    }
}
