//! Fresh-game construction and the save, load, and reset lifecycle.
//! This module exists to isolate session setup and persistence handoff from gameplay actions.
//! It does not own the save format itself or the rules of a round.

use std::io;

use rand_chacha::rand_core::SeedableRng;

use super::*;
use crate::error::{ConfigError, RestoreInvalid};
use crate::save::{self, BlobStore};

/// How `load_or_new` obtained the session it left behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored,
    /// No save existed. A fresh game was started and saved.
    Fresh,
    /// The save could not be adopted and was overwritten by a fresh game.
    Replaced(RestoreInvalid),
}

impl Game {
    pub fn new(seed: u64, config: GameConfig, content: ContentPack) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            ids: IdAllocator::new(),
            state: GameState::empty(&config),
            scheduler: CombatScheduler::new(config.combat_rules()),
            log: Vec::new(),
            config,
            content,
        };
        game.initialize_fresh();
        Ok(game)
    }

    /// Full health, starting gold, starter items, a stocked shop, and a new enemy.
    pub(super) fn initialize_fresh(&mut self) {
        self.state = GameState::empty(&self.config);
        self.scheduler = CombatScheduler::new(self.config.combat_rules());
        self.grant_starter_items();
        self.fill_shop();
        self.spawn_enemy();
        tracing::info!(seed = self.seed, gold = self.state.gold, "fresh game initialized");
    }

    fn grant_starter_items(&mut self) {
        let commons: Vec<usize> = self
            .content
            .templates()
            .iter()
            .enumerate()
            .filter(|(_, template)| template.rarity == Rarity::Common)
            .map(|(index, _)| index)
            .collect();
        if commons.is_empty() {
            return;
        }
        for slot in 0..self.config.starter_items {
            let index = commons[slot % commons.len()];
            if self.spawn_into(index, &[Owner::Player]).is_none() {
                tracing::debug!(slot, "starter item did not fit the roster");
            }
        }
    }

    /// Adopts a saved game. The running session is left untouched unless the
    /// whole blob validates.
    pub fn restore(&mut self, blob: &str) -> Result<(), RestoreInvalid> {
        let mut ids = self.ids.clone();
        let state = save::decode(blob, &self.content, &self.config, &mut ids)?;
        let rules = self.config.combat_rules();
        self.scheduler = match state.battle {
            Some(marker) => CombatScheduler::resumed(rules, marker.started_at),
            None => CombatScheduler::new(rules),
        };
        self.state = state;
        self.ids = ids;
        tracing::info!(items = self.state.items.len(), next_id = self.ids.peek(), "save restored");
        Ok(())
    }

    pub fn save(&self, store: &mut dyn BlobStore) -> io::Result<()> {
        let blob = save::encode(&self.state, &self.ids).map_err(io::Error::other)?;
        store.set(&self.config.save_key, &blob)
    }

    /// Restores the saved session, or starts and saves a fresh one when the
    /// save is missing or rejected.
    pub fn load_or_new(&mut self, store: &mut dyn BlobStore) -> io::Result<LoadOutcome> {
        let outcome = match store.get(&self.config.save_key)? {
            None => LoadOutcome::Fresh,
            Some(blob) => match self.restore(&blob) {
                Ok(()) => return Ok(LoadOutcome::Restored),
                Err(err) => {
                    tracing::warn!(%err, "save rejected, starting a fresh game");
                    LoadOutcome::Replaced(err)
                }
            },
        };
        self.initialize_fresh();
        self.save(store)?;
        Ok(outcome)
    }

    /// Deletes the save and starts over.
    pub fn reset(&mut self, store: &mut dyn BlobStore) -> io::Result<()> {
        store.remove(&self.config.save_key)?;
        self.log.clear();
        self.initialize_fresh();
        self.save(store)
    }
}
