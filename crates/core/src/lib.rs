pub mod combat;
pub mod config;
pub mod content;
pub mod error;
pub mod game;
pub mod grid;
pub mod ids;
pub mod save;
pub mod shape;
pub mod state;
pub mod types;

pub use combat::{Activation, BattlePhase, CombatRules, CombatScheduler, Combatants, TickReport};
pub use config::{GameConfig, GridSize};
pub use content::{ContentPack, ItemCatalog, ItemTemplate, RarityInfo};
pub use error::{ConfigError, GameError, PlacementRejection, RestoreInvalid, ShapeError};
pub use game::{Game, LoadOutcome, sale_value};
pub use grid::RosterGrid;
pub use ids::IdAllocator;
pub use save::{BlobStore, MemoryBlobStore, SAVE_FORMAT_VERSION};
pub use shape::{Shape, try_place};
pub use state::{GameState, HealthPools, ItemInstance, Items};
pub use types::*;
