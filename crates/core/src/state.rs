use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::Hasher;

use slotmap::SlotMap;
use xxhash_rust::xxh3::Xxh3;

use crate::combat::Combatants;
use crate::config::GameConfig;
use crate::grid::RosterGrid;
#[cfg(test)]
use crate::ids::IdAllocator;
use crate::shape::{Shape, try_place};
use crate::types::*;

/// One logical item. Grids reference it through its `ItemKey`.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemInstance {
    pub id: ItemId,
    pub template_key: String,
    pub name: String,
    pub shape: Shape,
    pub damage: u32,
    pub heal: u32,
    pub cooldown_ms: Millis,
    pub price: u32,
    pub rarity: Rarity,
    pub owner: Owner,
    pub next_activation: Option<Millis>,
}

pub type Items = SlotMap<ItemKey, ItemInstance>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthPools {
    pub player: u32,
    pub enemy: u32,
    pub max: u32,
}

impl HealthPools {
    pub fn full(max: u32) -> Self {
        Self { player: max, enemy: max, max }
    }

    fn slot(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// Floors at zero.
    pub fn damage(&mut self, side: Side, amount: u32) {
        let hp = self.slot(side);
        *hp = hp.saturating_sub(amount);
    }

    /// Caps at `max`.
    pub fn heal(&mut self, side: Side, amount: u32) {
        let max = self.max;
        let hp = self.slot(side);
        *hp = hp.saturating_add(amount).min(max);
    }

    pub fn restore(&mut self, side: Side) {
        *self.slot(side) = self.max;
    }

    pub fn anyone_down(&self) -> bool {
        self.player == 0 || self.enemy == 0
    }

    pub fn leader(&self) -> Winner {
        match self.player.cmp(&self.enemy) {
            Ordering::Greater => Winner::Player,
            Ordering::Less => Winner::Enemy,
            Ordering::Equal => Winner::Draw,
        }
    }
}

/// Present while a battle session is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BattleMarker {
    pub started_at: Millis,
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub health: HealthPools,
    pub items: Items,
    pub player_roster: RosterGrid,
    pub enemy_roster: RosterGrid,
    pub player_stash: RosterGrid,
    pub enemy_stash: RosterGrid,
    pub shared_stash: RosterGrid,
    pub shop: Vec<ItemKey>,
    pub gold: u32,
    pub battle: Option<BattleMarker>,
}

impl GameState {
    /// Full health, starting gold, and five empty grids.
    pub fn empty(config: &GameConfig) -> Self {
        Self {
            health: HealthPools::full(config.max_hp),
            items: SlotMap::with_key(),
            player_roster: RosterGrid::new(Owner::Player, config.player_roster),
            enemy_roster: RosterGrid::new(Owner::Enemy, config.enemy_roster),
            player_stash: RosterGrid::new(Owner::PlayerStash, config.player_stash),
            enemy_stash: RosterGrid::new(Owner::EnemyStash, config.enemy_stash),
            shared_stash: RosterGrid::new(Owner::SharedStash, config.shared_stash),
            shop: Vec::new(),
            gold: config.start_gold,
            battle: None,
        }
    }

    pub fn grid(&self, owner: Owner) -> Option<&RosterGrid> {
        match owner {
            Owner::Player => Some(&self.player_roster),
            Owner::Enemy => Some(&self.enemy_roster),
            Owner::PlayerStash => Some(&self.player_stash),
            Owner::EnemyStash => Some(&self.enemy_stash),
            Owner::SharedStash => Some(&self.shared_stash),
            Owner::Shop => None,
        }
    }

    pub fn grid_mut(&mut self, owner: Owner) -> Option<&mut RosterGrid> {
        self.grid_and_items_mut(owner).map(|(grid, _)| grid)
    }

    /// Splits the borrow so a grid can commit items from the arena.
    pub fn grid_and_items_mut(&mut self, owner: Owner) -> Option<(&mut RosterGrid, &mut Items)> {
        let grid = match owner {
            Owner::Player => &mut self.player_roster,
            Owner::Enemy => &mut self.enemy_roster,
            Owner::PlayerStash => &mut self.player_stash,
            Owner::EnemyStash => &mut self.enemy_stash,
            Owner::SharedStash => &mut self.shared_stash,
            Owner::Shop => return None,
        };
        Some((grid, &mut self.items))
    }

    pub fn grids(&self) -> [&RosterGrid; 5] {
        [
            &self.player_roster,
            &self.enemy_roster,
            &self.player_stash,
            &self.enemy_stash,
            &self.shared_stash,
        ]
    }

    pub fn combatants(&mut self) -> Combatants<'_> {
        Combatants {
            items: &mut self.items,
            player_roster: &self.player_roster,
            enemy_roster: &self.enemy_roster,
            health: &mut self.health,
        }
    }

    pub fn find(&self, id: ItemId) -> Option<ItemKey> {
        self.items.iter().find(|(_, item)| item.id == id).map(|(key, _)| key)
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemInstance> {
        self.find(id).map(|key| &self.items[key])
    }

    /// Distinct items in a container, for rendering or iteration.
    pub fn instances_in(&self, owner: Owner) -> Vec<&ItemInstance> {
        let keys = match self.grid(owner) {
            Some(grid) => grid.unique_instances(),
            None => self.shop.clone(),
        };
        keys.into_iter().filter_map(|key| self.items.get(key)).collect()
    }

    /// Removes an item from every grid, the shop, and the arena.
    pub fn remove_item(&mut self, key: ItemKey) -> Option<ItemInstance> {
        for owner in Owner::GRIDS {
            if let Some(grid) = self.grid_mut(owner) {
                grid.evict(key);
            }
        }
        self.shop.retain(|offer| *offer != key);
        self.items.remove(key)
    }

    /// Empties a grid and drops its items from the arena.
    pub fn discard_grid(&mut self, owner: Owner) -> usize {
        let Some(grid) = self.grid_mut(owner) else {
            return 0;
        };
        let removed = grid.clear();
        for key in &removed {
            self.items.remove(*key);
        }
        removed.len()
    }

    /// Checks that every grid cell set matches its item's footprint, owner
    /// tags match containers, and ids are unique.
    pub fn verify_integrity(&self) -> Result<(), String> {
        let mut homes: BTreeMap<ItemKey, Owner> = BTreeMap::new();
        let mut ids: BTreeMap<ItemId, ItemKey> = BTreeMap::new();

        for grid in self.grids() {
            for key in grid.unique_instances() {
                let item = self
                    .items
                    .get(key)
                    .ok_or_else(|| format!("{} grid references a dead handle", grid.owner()))?;
                if let Some(previous) = homes.insert(key, grid.owner()) {
                    return Err(format!("{} is in both {previous} and {}", item.id, grid.owner()));
                }
                if item.owner != grid.owner() {
                    return Err(format!(
                        "{} is tagged {} but stored in {}",
                        item.id,
                        item.owner,
                        grid.owner()
                    ));
                }
                let cells = grid.cells_of(key);
                let expected = grid
                    .anchor_of(&item.shape, key)
                    .and_then(|anchor| footprint_ignoring(grid, &item.shape, anchor, key));
                if expected.as_deref() != Some(cells.as_slice()) {
                    return Err(format!("{} occupies {cells:?}, not its shape", item.id));
                }
            }
        }

        for key in &self.shop {
            let item = self.items.get(*key).ok_or("shop references a dead handle")?;
            if homes.insert(*key, Owner::Shop).is_some() {
                return Err(format!("{} is both offered and placed", item.id));
            }
            if item.owner != Owner::Shop {
                return Err(format!("shop offer {} is tagged {}", item.id, item.owner));
            }
        }

        for (key, item) in &self.items {
            if !homes.contains_key(&key) {
                return Err(format!("{} is in the arena but in no container", item.id));
            }
            if let Some(other) = ids.insert(item.id, key)
                && other != key
            {
                return Err(format!("{} is shared by two items", item.id));
            }
        }

        if self.health.player > self.health.max || self.health.enemy > self.health.max {
            return Err("health exceeds maximum".to_string());
        }
        Ok(())
    }

    /// Stable hash over health, gold, the battle marker, every grid cell, and
    /// the shop. The id counter lives outside the state and is not included.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u32(self.health.player);
        hasher.write_u32(self.health.enemy);
        hasher.write_u32(self.health.max);
        hasher.write_u32(self.gold);
        match self.battle {
            None => hasher.write_u8(0),
            Some(marker) => {
                hasher.write_u8(1);
                hasher.write_u64(marker.started_at);
            }
        }
        for grid in self.grids() {
            hasher.write_usize(grid.len());
            for cell in grid.cells() {
                match cell.and_then(|key| self.items.get(key)) {
                    None => hasher.write_u64(0),
                    Some(item) => hash_item(&mut hasher, item),
                }
            }
        }
        hasher.write_usize(self.shop.len());
        for key in &self.shop {
            if let Some(item) = self.items.get(*key) {
                hash_item(&mut hasher, item);
            }
        }
        hasher.finish()
    }
}

fn hash_item(hasher: &mut Xxh3, item: &ItemInstance) {
    hasher.write_u64(item.id.0);
    hasher.write(item.template_key.as_bytes());
    hasher.write_u8(item.owner as u8);
    hasher.write_u64(item.next_activation.unwrap_or(u64::MAX));
}

/// The cells `shape` covers at `anchor`, treating `key`'s own cells as free.
fn footprint_ignoring(
    grid: &RosterGrid,
    shape: &Shape,
    anchor: usize,
    key: ItemKey,
) -> Option<Vec<usize>> {
    let cells: Vec<Option<ItemKey>> =
        grid.cells().iter().map(|cell| cell.filter(|other| *other != key)).collect();
    try_place(&cells, grid.columns(), grid.rows(), anchor, shape).ok()
}

#[cfg(test)]
pub(crate) fn test_item(ids: &mut IdAllocator, shape: Shape, owner: Owner) -> ItemInstance {
    ItemInstance {
        id: ids.allocate().expect("test ids"),
        template_key: "test".to_string(),
        name: "Test".to_string(),
        shape,
        damage: 0,
        heal: 0,
        cooldown_ms: 1000,
        price: 10,
        rarity: Rarity::Common,
        owner,
        next_activation: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_is_floored_and_capped() {
        let mut health = HealthPools::full(100);
        health.damage(Side::Enemy, 130);
        assert_eq!(health.enemy, 0);
        health.damage(Side::Player, 30);
        health.heal(Side::Player, 50);
        assert_eq!(health.player, 100);
        assert!(health.anyone_down());
        assert_eq!(health.leader(), Winner::Player);
    }

    #[test]
    fn remove_item_clears_every_reference() {
        let config = GameConfig::default();
        let mut state = GameState::empty(&config);
        let mut ids = IdAllocator::new();
        let key = state.items.insert(test_item(&mut ids, Shape::rect(2, 2), Owner::Shop));
        let (grid, items) = state.grid_and_items_mut(Owner::PlayerStash).expect("grid");
        grid.commit(items, key, 0).expect("fits");
        assert_eq!(state.verify_integrity(), Ok(()));

        let removed = state.remove_item(key).expect("live item");
        assert_eq!(removed.owner, Owner::PlayerStash);
        assert!(state.player_stash.is_empty());
        assert!(state.items.is_empty());
        assert_eq!(state.remove_item(key), None);
    }

    #[test]
    fn integrity_check_catches_stray_cell() {
        let config = GameConfig::default();
        let mut state = GameState::empty(&config);
        let mut ids = IdAllocator::new();
        let key = state.items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        let (grid, items) = state.grid_and_items_mut(Owner::Player).expect("grid");
        grid.commit(items, key, 0).expect("fits");
        state.player_roster.occupy(key, &[5]);
        assert!(state.verify_integrity().is_err());
    }

    #[test]
    fn integrity_check_catches_wrong_owner_tag() {
        let config = GameConfig::default();
        let mut state = GameState::empty(&config);
        let mut ids = IdAllocator::new();
        let key = state.items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        let (grid, items) = state.grid_and_items_mut(Owner::Player).expect("grid");
        grid.commit(items, key, 0).expect("fits");
        state.items[key].owner = Owner::Enemy;
        assert!(state.verify_integrity().is_err());
    }

    #[test]
    fn snapshot_hash_tracks_occupancy() {
        let config = GameConfig::default();
        let mut state = GameState::empty(&config);
        let empty_hash = state.snapshot_hash();
        let mut ids = IdAllocator::new();
        let key = state.items.insert(test_item(&mut ids, Shape::rect(1, 1), Owner::Shop));
        state.shop.push(key);
        assert_ne!(state.snapshot_hash(), empty_hash);
        state.remove_item(key);
        assert_eq!(state.snapshot_hash(), empty_hash);
    }

    #[test]
    fn snapshot_hash_covers_the_battle_marker() {
        let mut state = GameState::empty(&GameConfig::default());
        let idle = state.snapshot_hash();
        state.battle = Some(BattleMarker { started_at: 0 });
        let started_at_zero = state.snapshot_hash();
        state.battle = Some(BattleMarker { started_at: 40 });
        assert_ne!(started_at_zero, idle);
        assert_ne!(state.snapshot_hash(), started_at_zero);
    }
}
