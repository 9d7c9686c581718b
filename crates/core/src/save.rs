//! JSON save blobs that keep multi-cell items as single objects across a reload.
//!
//! A blob stores every grid as a flat array of exactly `columns × rows` entries.
//! Each occupied entry repeats the item record (`id`, `template_key`, `owner`,
//! `next_activation`), so an item spanning four cells appears four times.
//! Restoring groups those records by id and binds all of their cells to one
//! arena handle; stats are rebuilt from the catalog, never read from the blob.
//!
//! Restore is all-or-nothing. Any validation failure leaves the caller's
//! `IdAllocator` untouched and returns `RestoreInvalid`.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::io;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::content::ItemCatalog;
use crate::error::RestoreInvalid;
use crate::ids::IdAllocator;
use crate::state::{BattleMarker, GameState};
use crate::types::{ItemId, ItemKey, Millis, Owner};

pub const SAVE_FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Blob stores
// ---------------------------------------------------------------------------

/// String-keyed persistence medium.
pub trait BlobStore {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryBlobStore {
    entries: BTreeMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File format structs
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct SaveBlob {
    format_version: u32,
    health: HealthRecord,
    gold: u32,
    next_item_id: u64,
    #[serde(default)]
    battle: Option<BattleRecord>,
    grids: GridRecords,
    shop: Vec<OfferRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
struct HealthRecord {
    player: u32,
    enemy: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
struct BattleRecord {
    started_at: Millis,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct GridRecords {
    player: Vec<Option<CellRecord>>,
    enemy: Vec<Option<CellRecord>>,
    player_stash: Vec<Option<CellRecord>>,
    enemy_stash: Vec<Option<CellRecord>>,
    shared_stash: Vec<Option<CellRecord>>,
}

impl GridRecords {
    fn into_owned(self) -> [(Owner, Vec<Option<CellRecord>>); 5] {
        [
            (Owner::Player, self.player),
            (Owner::Enemy, self.enemy),
            (Owner::PlayerStash, self.player_stash),
            (Owner::EnemyStash, self.enemy_stash),
            (Owner::SharedStash, self.shared_stash),
        ]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct CellRecord {
    id: ItemId,
    template_key: String,
    owner: Owner,
    next_activation: Option<Millis>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct OfferRecord {
    id: ItemId,
    template_key: String,
    owner: Owner,
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

pub fn encode(state: &GameState, ids: &IdAllocator) -> Result<String, serde_json::Error> {
    let grid = |owner: Owner| -> Vec<Option<CellRecord>> {
        state
            .grid(owner)
            .map(|grid| {
                grid.cells()
                    .iter()
                    .map(|cell| cell.and_then(|key| cell_record(state, key)))
                    .collect()
            })
            .unwrap_or_default()
    };

    let blob = SaveBlob {
        format_version: SAVE_FORMAT_VERSION,
        health: HealthRecord { player: state.health.player, enemy: state.health.enemy },
        gold: state.gold,
        next_item_id: ids.peek(),
        battle: state.battle.map(|marker| BattleRecord { started_at: marker.started_at }),
        grids: GridRecords {
            player: grid(Owner::Player),
            enemy: grid(Owner::Enemy),
            player_stash: grid(Owner::PlayerStash),
            enemy_stash: grid(Owner::EnemyStash),
            shared_stash: grid(Owner::SharedStash),
        },
        shop: state
            .shop
            .iter()
            .filter_map(|key| state.items.get(*key))
            .map(|item| OfferRecord {
                id: item.id,
                template_key: item.template_key.clone(),
                owner: item.owner,
            })
            .collect(),
    };
    serde_json::to_string(&blob)
}

fn cell_record(state: &GameState, key: ItemKey) -> Option<CellRecord> {
    state.items.get(key).map(|item| CellRecord {
        id: item.id,
        template_key: item.template_key.clone(),
        owner: item.owner,
        next_activation: item.next_activation,
    })
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

pub fn decode<C: ItemCatalog + ?Sized>(
    blob: &str,
    catalog: &C,
    config: &GameConfig,
    ids: &mut IdAllocator,
) -> Result<GameState, RestoreInvalid> {
    let blob: SaveBlob =
        serde_json::from_str(blob).map_err(|err| RestoreInvalid::Malformed(err.to_string()))?;
    if blob.format_version != SAVE_FORMAT_VERSION {
        return Err(RestoreInvalid::FormatVersion {
            found: blob.format_version,
            expected: SAVE_FORMAT_VERSION,
        });
    }
    if blob.next_item_id == u64::MAX {
        return Err(RestoreInvalid::IdSpace(blob.next_item_id));
    }
    for found in [blob.health.player, blob.health.enemy] {
        if found > config.max_hp {
            return Err(RestoreInvalid::HealthOutOfRange { found, max: config.max_hp });
        }
    }

    let mut state = GameState::empty(config);
    state.health.player = blob.health.player;
    state.health.enemy = blob.health.enemy;
    state.gold = blob.gold;
    state.battle = blob.battle.map(|record| BattleMarker { started_at: record.started_at });

    let mut seen = BTreeSet::new();
    for (owner, records) in blob.grids.into_owned() {
        restore_grid(&mut state, catalog, owner, records, &mut seen)?;
    }
    for offer in blob.shop {
        if offer.owner != Owner::Shop {
            return Err(RestoreInvalid::OwnerMismatch {
                id: offer.id,
                container: Owner::Shop,
                found: offer.owner,
            });
        }
        check_id_space(offer.id)?;
        if !seen.insert(offer.id) {
            return Err(RestoreInvalid::DuplicateId(offer.id));
        }
        let item = catalog
            .instantiate(&offer.template_key, Owner::Shop, offer.id)
            .map_err(|_| RestoreInvalid::UnknownTemplate(offer.template_key.clone()))?;
        let key = state.items.insert(item);
        state.shop.push(key);
    }

    if let Some(max) = seen.last() {
        ids.advance_past(*max);
    }
    ids.advance_to(blob.next_item_id);
    Ok(state)
}

/// Restored ids must leave the allocator room to hand out a larger one.
fn check_id_space(id: ItemId) -> Result<(), RestoreInvalid> {
    if id.0 == u64::MAX {
        return Err(RestoreInvalid::IdSpace(id.0));
    }
    Ok(())
}

fn restore_grid<C: ItemCatalog + ?Sized>(
    state: &mut GameState,
    catalog: &C,
    owner: Owner,
    records: Vec<Option<CellRecord>>,
    seen: &mut BTreeSet<ItemId>,
) -> Result<(), RestoreInvalid> {
    let Some((grid, items)) = state.grid_and_items_mut(owner) else {
        return Ok(());
    };
    if records.len() != grid.len() {
        return Err(RestoreInvalid::GridSize {
            grid: owner,
            expected: grid.len(),
            found: records.len(),
        });
    }

    // Cells are visited in ascending order, so each group's first cell is its lowest.
    let mut groups: BTreeMap<ItemId, (CellRecord, Vec<usize>)> = BTreeMap::new();
    for (index, record) in records.into_iter().enumerate() {
        let Some(record) = record else {
            continue;
        };
        match groups.entry(record.id) {
            Entry::Vacant(slot) => {
                slot.insert((record, vec![index]));
            }
            Entry::Occupied(mut slot) => {
                let (first, cells) = slot.get_mut();
                if *first != record {
                    return Err(RestoreInvalid::InconsistentRecords(record.id));
                }
                cells.push(index);
            }
        }
    }

    for (id, (record, cells)) in groups {
        if record.owner != owner {
            return Err(RestoreInvalid::OwnerMismatch { id, container: owner, found: record.owner });
        }
        check_id_space(id)?;
        if !seen.insert(id) {
            return Err(RestoreInvalid::DuplicateId(id));
        }
        let mut item = catalog
            .instantiate(&record.template_key, owner, id)
            .map_err(|_| RestoreInvalid::UnknownTemplate(record.template_key.clone()))?;
        item.next_activation = record.next_activation;

        let lowest = cells.first().copied().ok_or(RestoreInvalid::Footprint(id))?;
        let footprint = grid
            .anchor_for_lowest_cell(&item.shape, lowest)
            .and_then(|anchor| grid.fit(anchor, &item.shape).ok())
            .ok_or(RestoreInvalid::Footprint(id))?;
        if footprint != cells {
            return Err(RestoreInvalid::Footprint(id));
        }
        let key = items.insert(item);
        grid.occupy(key, &cells);
    }
    Ok(())
}
