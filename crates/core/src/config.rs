//! Tunable game rules. Defaults reproduce the shipped browser game.

use serde::{Deserialize, Serialize};

use crate::combat::CombatRules;
use crate::error::ConfigError;
use crate::types::{Millis, Owner};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub columns: usize,
    pub rows: usize,
}

impl GridSize {
    pub const fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    pub const fn cell_count(self) -> usize {
        self.columns * self.rows
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_roster: GridSize,
    pub enemy_roster: GridSize,
    pub player_stash: GridSize,
    pub enemy_stash: GridSize,
    pub shared_stash: GridSize,
    pub max_hp: u32,
    pub start_gold: u32,
    pub shop_size: usize,
    pub starter_items: usize,
    pub enemy_items: usize,
    pub enemy_stash_min: usize,
    pub enemy_stash_max: usize,
    /// Suggested driver cadence for `tick`. The scheduler itself ignores it.
    pub tick_ms: Millis,
    /// Ends a battle after this long even if both sides are standing.
    pub battle_time_limit_ms: Option<Millis>,
    pub min_victory_reward: u32,
    pub sell_ratio: f64,
    pub save_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_roster: GridSize::new(6, 3),
            enemy_roster: GridSize::new(6, 3),
            player_stash: GridSize::new(6, 6),
            enemy_stash: GridSize::new(6, 6),
            shared_stash: GridSize::new(10, 4),
            max_hp: 100,
            start_gold: 200,
            shop_size: 5,
            starter_items: 3,
            enemy_items: 3,
            enemy_stash_min: 2,
            enemy_stash_max: 4,
            tick_ms: 120,
            battle_time_limit_ms: None,
            min_victory_reward: 5,
            sell_ratio: 0.5,
            save_key: "autobatt_swiss_v1".to_string(),
        }
    }
}

impl GameConfig {
    /// Grid dimensions for a container; `None` for the shop.
    pub fn grid_size(&self, owner: Owner) -> Option<GridSize> {
        match owner {
            Owner::Player => Some(self.player_roster),
            Owner::Enemy => Some(self.enemy_roster),
            Owner::PlayerStash => Some(self.player_stash),
            Owner::EnemyStash => Some(self.enemy_stash),
            Owner::SharedStash => Some(self.shared_stash),
            Owner::Shop => None,
        }
    }

    pub fn combat_rules(&self) -> CombatRules {
        CombatRules { time_limit_ms: self.battle_time_limit_ms }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for owner in Owner::GRIDS {
            if let Some(size) = self.grid_size(owner)
                && size.cell_count() == 0
            {
                return Err(ConfigError::EmptyGrid(owner));
            }
        }
        if self.max_hp == 0 {
            return Err(ConfigError::ZeroMaxHp);
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.enemy_stash_min > self.enemy_stash_max {
            return Err(ConfigError::StashRange {
                min: self.enemy_stash_min,
                max: self.enemy_stash_max,
            });
        }
        let spawns = [
            (Owner::Enemy, self.enemy_items, self.enemy_roster),
            (Owner::EnemyStash, self.enemy_stash_max, self.enemy_stash),
        ];
        for (owner, count, size) in spawns {
            if count > size.cell_count() {
                return Err(ConfigError::SpawnCapacity { owner, count, cells: size.cell_count() });
            }
        }
        if !(0.0..=1.0).contains(&self.sell_ratio) {
            return Err(ConfigError::SellRatio(self.sell_ratio));
        }
        Ok(())
    }
}
