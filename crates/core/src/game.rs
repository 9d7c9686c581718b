//! Session facade over the grids, shop, combat scheduler, and save codec.
//! This module exists to give a UI or tool a single owner for every mutating game action.
//! It does not own placement geometry, combat timing rules, or the save wire format.

use std::mem;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::Rng;

use crate::combat::{BattlePhase, CombatScheduler};
use crate::config::GameConfig;
use crate::content::{ContentPack, ItemCatalog};
use crate::error::GameError;
use crate::ids::IdAllocator;
use crate::state::{GameState, HealthPools, ItemInstance};
use crate::types::*;

mod battle;
mod bootstrap;
mod hash;
mod placement;
mod shop;

#[cfg(test)]
mod test_support;

pub use bootstrap::LoadOutcome;
pub use shop::sale_value;

pub struct Game {
    seed: u64,
    config: GameConfig,
    content: ContentPack,
    ids: IdAllocator,
    rng: ChaCha8Rng,
    state: GameState,
    scheduler: CombatScheduler,
    log: Vec<LogEvent>,
}

impl Game {
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentPack {
        &self.content
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn phase(&self) -> BattlePhase {
        self.scheduler.phase()
    }

    pub fn gold(&self) -> u32 {
        self.state.gold
    }

    pub fn health(&self) -> HealthPools {
        self.state.health
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    /// Hands the journal to the caller and starts a new one.
    pub fn drain_log(&mut self) -> Vec<LogEvent> {
        mem::take(&mut self.log)
    }

    /// Distinct items in a container, in the order a UI should draw them.
    pub fn instances_in(&self, owner: Owner) -> Vec<&ItemInstance> {
        self.state.instances_in(owner)
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemInstance> {
        self.state.item(id)
    }

    fn ensure_idle(&self) -> Result<(), GameError> {
        if self.scheduler.is_running() {
            return Err(GameError::BattleInProgress);
        }
        Ok(())
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.next_u64() as usize % len
    }

    fn random_template(&mut self) -> Option<usize> {
        match self.content.templates().len() {
            0 => None,
            count => Some(self.pick(count)),
        }
    }

    /// Creates an item from the template at `index` and first-fits it into the
    /// first grid in `targets` with room. Nothing is kept if none can take it.
    fn spawn_into(&mut self, index: usize, targets: &[Owner]) -> Option<(ItemKey, Owner)> {
        let template = self.content.templates().get(index)?;
        let id = match self.ids.allocate() {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(%err, template = %template.key, "item not spawned");
                return None;
            }
        };
        let item = self.content.instantiate_template(template, Owner::Shop, id);
        let key = self.state.items.insert(item);
        for &owner in targets {
            if let Some((grid, items)) = self.state.grid_and_items_mut(owner)
                && grid.first_fit(items, key).is_ok()
            {
                return Some((key, owner));
            }
        }
        self.state.items.remove(key);
        None
    }
}
