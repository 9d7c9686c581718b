use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use slotmap::new_key_type;

new_key_type! {
    /// Arena handle for a live item. Grid cells and shop offers hold these,
    /// never copies of the item itself.
    pub struct ItemKey;
}

/// Milliseconds on the caller's clock.
pub type Millis = u64;

/// Persistent item identity, rendered as `itm-N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u64);

impl ItemId {
    pub const PREFIX: &'static str = "itm-";

    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix(Self::PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).ok_or_else(|| D::Error::custom(format!("malformed item id `{text}`")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Container tag carried by every item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Owner {
    Player,
    Enemy,
    PlayerStash,
    EnemyStash,
    SharedStash,
    Shop,
}

/// What a caller may do with items in a given container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub accepts_drops: bool,
    pub draggable: bool,
    pub sellable: bool,
}

impl Owner {
    /// Every container backed by a grid, in save order.
    pub const GRIDS: [Owner; 5] =
        [Owner::Player, Owner::Enemy, Owner::PlayerStash, Owner::EnemyStash, Owner::SharedStash];

    pub const fn capabilities(self) -> Capabilities {
        match self {
            Owner::Player | Owner::PlayerStash => {
                Capabilities { accepts_drops: true, draggable: true, sellable: true }
            }
            Owner::SharedStash => {
                Capabilities { accepts_drops: true, draggable: true, sellable: false }
            }
            Owner::Enemy | Owner::EnemyStash => {
                Capabilities { accepts_drops: false, draggable: false, sellable: false }
            }
            Owner::Shop => Capabilities { accepts_drops: false, draggable: true, sellable: false },
        }
    }

    /// The combat side this container fights for, if it is a roster.
    pub const fn side(self) -> Option<Side> {
        match self {
            Owner::Player => Some(Side::Player),
            Owner::Enemy => Some(Side::Enemy),
            _ => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Owner::Player => "player",
            Owner::Enemy => "enemy",
            Owner::PlayerStash => "player-stash",
            Owner::EnemyStash => "enemy-stash",
            Owner::SharedStash => "shared-stash",
            Owner::Shop => "shop",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Player, Side::Enemy];

    pub const fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    pub const fn roster(self) -> Owner {
        match self {
            Side::Player => Owner::Player,
            Side::Enemy => Owner::Enemy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winner {
    Player,
    Enemy,
    Draw,
}

/// Player-facing battle and shop journal kept alongside the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEvent {
    BattleStarted { at: Millis },
    ItemActivated { side: Side, item: ItemId, damage: u32, heal: u32, at: Millis },
    BattleEnded { winner: Winner },
    BattleAbandoned,
    Purchased { item: ItemId, price: u32 },
    Sold { item: ItemId, value: u32 },
    Moved { item: ItemId, to: Owner },
    RewardGranted { gold: u32 },
    LootDropped { item: ItemId, into: Owner },
    LootDiscarded { template_key: String },
    ShopRefilled { offers: usize },
    EnemyGenerated { roster_items: usize, stash_items: usize },
}
