//! Error types raised by placement, combat, restore, and configuration.

use thiserror::Error;

use crate::types::{ItemId, Owner};

/// Why a shape could not be placed at a given anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlacementRejection {
    #[error("cell ({row}, {col}) lies outside the grid")]
    OffGrid { row: usize, col: usize },

    #[error("cell {index} is already occupied")]
    Collision { index: usize },

    #[error("no free position fits the item")]
    NoFreePosition,

    #[error("item is already placed in this grid")]
    AlreadyPlaced,
}

/// Errors surfaced by game operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("unknown item template `{0}`")]
    NotFound(String),

    #[error("placement rejected: {0}")]
    PlacementRejected(#[from] PlacementRejection),

    #[error("a battle is already running")]
    AlreadyRunning,

    #[error("no battle is running")]
    NotRunning,

    #[error("items cannot be rearranged while a battle is running")]
    BattleInProgress,

    #[error("item {0} does not exist")]
    UnknownItem(ItemId),

    #[error("item handle is no longer live")]
    StaleHandle,

    #[error("{action} is not allowed for {owner}")]
    Forbidden { owner: Owner, action: &'static str },

    #[error("not enough gold: need {needed}, have {available}")]
    InsufficientGold { needed: u32, available: u32 },

    #[error("no item ids left to allocate")]
    IdSpaceExhausted,
}

/// A persisted blob that cannot be adopted. Restore is all-or-nothing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RestoreInvalid {
    #[error("save blob is not valid JSON for this schema: {0}")]
    Malformed(String),

    #[error("unsupported save format version {found} (expected {expected})")]
    FormatVersion { found: u32, expected: u32 },

    #[error("{grid} grid has {found} cell records, expected {expected}")]
    GridSize { grid: Owner, expected: usize, found: usize },

    #[error("unknown item template `{0}`")]
    UnknownTemplate(String),

    #[error("cell records for {0} disagree on template, owner, or timer")]
    InconsistentRecords(ItemId),

    #[error("cells recorded for {0} do not match its shape")]
    Footprint(ItemId),

    #[error("{0} appears in more than one container")]
    DuplicateId(ItemId),

    #[error("{id} is tagged {found} but stored in {container}")]
    OwnerMismatch { id: ItemId, container: Owner, found: Owner },

    #[error("health {found} exceeds the maximum of {max}")]
    HealthOutOfRange { found: u32, max: u32 },

    #[error("item id {0} leaves no room for new ids")]
    IdSpace(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shape mask has no rows or columns")]
    Empty,

    #[error("shape mask row {row} has {found} columns, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },

    #[error("shape mask occupies no cells")]
    NoCells,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} grid must have at least one column and one row")]
    EmptyGrid(Owner),

    #[error("max_hp must be positive")]
    ZeroMaxHp,

    #[error("tick_ms must be positive")]
    ZeroTick,

    #[error("enemy stash range {min}..={max} is inverted")]
    StashRange { min: usize, max: usize },

    #[error("{owner} cannot hold {count} spawned items in {cells} cells")]
    SpawnCapacity { owner: Owner, count: usize, cells: usize },

    #[error("sell_ratio {0} is outside 0..=1")]
    SellRatio(f64),
}
