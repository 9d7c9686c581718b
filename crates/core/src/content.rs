use crate::error::GameError;
use crate::ids::IdAllocator;
use crate::shape::Shape;
use crate::state::ItemInstance;
use crate::types::{ItemId, Owner, Rarity};

pub mod keys {
    pub const KNIFE: &str = "knife";
    pub const POTION: &str = "potion";
    pub const CLUB: &str = "club";
    pub const BUCKLER: &str = "buckler";

    pub const RAPIER: &str = "rapier";
    pub const CROSSBOW: &str = "crossbow";
    pub const FIELD_KIT: &str = "fieldkit";
    pub const LANCE: &str = "lance";

    pub const SUNBLADE: &str = "sunblade";
    pub const MEDI_CORE: &str = "medicore";
    pub const HALBERD: &str = "halberd";

    pub const AEGIS: &str = "aegis";
    pub const DAWN_CANNON: &str = "dawncannon";
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemTemplate {
    pub key: String,
    pub name: String,
    pub base_damage: u32,
    pub base_heal: u32,
    pub cooldown_seconds: f64,
    pub base_price: u32,
    pub rarity: Rarity,
    pub shape: Shape,
}

impl ItemTemplate {
    fn rect(
        key: &str,
        name: &str,
        (damage, heal): (u32, u32),
        cooldown_seconds: f64,
        price: u32,
        rarity: Rarity,
        (width, height): (usize, usize),
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            base_damage: damage,
            base_heal: heal,
            cooldown_seconds,
            base_price: price,
            rarity,
            shape: Shape::rect(width, height),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RarityInfo {
    pub rarity: Rarity,
    pub label: &'static str,
    pub multiplier: f64,
}

/// Template lookup consumed by the instance factory and the save codec.
pub trait ItemCatalog {
    fn lookup(&self, key: &str) -> Option<&ItemTemplate>;

    fn rarity_multiplier(&self, rarity: Rarity) -> f64;

    fn templates(&self) -> &[ItemTemplate];

    /// Builds an instance with a caller-chosen id. Stats are scaled once here.
    fn instantiate(&self, key: &str, owner: Owner, id: ItemId) -> Result<ItemInstance, GameError> {
        let template = self.lookup(key).ok_or_else(|| GameError::NotFound(key.to_string()))?;
        Ok(self.instantiate_template(template, owner, id))
    }

    fn instantiate_template(
        &self,
        template: &ItemTemplate,
        owner: Owner,
        id: ItemId,
    ) -> ItemInstance {
        let multiplier = self.rarity_multiplier(template.rarity);
        ItemInstance {
            id,
            template_key: template.key.clone(),
            name: template.name.clone(),
            shape: template.shape.clone(),
            damage: scale(template.base_damage, multiplier),
            heal: scale(template.base_heal, multiplier),
            cooldown_ms: cooldown_ms(template.cooldown_seconds),
            price: scale(template.base_price, multiplier),
            rarity: template.rarity,
            owner,
            next_activation: None,
        }
    }

    /// Builds an instance with a fresh id. Unknown keys do not consume an id.
    fn create_instance(
        &self,
        key: &str,
        owner: Owner,
        ids: &mut IdAllocator,
    ) -> Result<ItemInstance, GameError> {
        if self.lookup(key).is_none() {
            return Err(GameError::NotFound(key.to_string()));
        }
        self.instantiate(key, owner, ids.allocate()?)
    }
}

fn scale(base: u32, multiplier: f64) -> u32 {
    (f64::from(base) * multiplier).round().max(0.0) as u32
}

fn cooldown_ms(seconds: f64) -> u64 {
    // Cooldowns are kept at centisecond precision.
    let centis = (seconds * 100.0).round().max(1.0);
    (centis as u64) * 10
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContentPack {
    pub templates: Vec<ItemTemplate>,
    pub rarities: Vec<RarityInfo>,
}

impl ContentPack {
    pub fn build_default() -> Self {
        use Rarity::*;
        Self {
            templates: vec![
                ItemTemplate::rect(keys::KNIFE, "Messer", (8, 0), 1.3, 20, Common, (1, 1)),
                ItemTemplate::rect(keys::POTION, "Heiltrank", (0, 10), 2.2, 24, Common, (1, 1)),
                ItemTemplate::rect(keys::CLUB, "Keule", (14, 0), 2.4, 34, Common, (1, 2)),
                ItemTemplate::rect(keys::BUCKLER, "Buckler", (4, 5), 2.1, 32, Common, (2, 1)),
                ItemTemplate::rect(keys::RAPIER, "Rapier", (22, 0), 2.4, 54, Rare, (1, 2)),
                ItemTemplate::rect(keys::CROSSBOW, "Armbrust", (26, 0), 3.4, 62, Rare, (2, 1)),
                ItemTemplate::rect(keys::FIELD_KIT, "Field Kit", (0, 18), 3.2, 58, Rare, (2, 1)),
                ItemTemplate::rect(keys::LANCE, "Lanze", (24, 0), 2.6, 66, Rare, (1, 3)),
                ItemTemplate::rect(keys::SUNBLADE, "Sunblade", (32, 5), 2.8, 92, Epic, (2, 2)),
                ItemTemplate::rect(keys::MEDI_CORE, "Medi-Core", (8, 24), 3.6, 96, Epic, (2, 2)),
                ItemTemplate::rect(keys::HALBERD, "Hellebarde", (36, 0), 3.3, 110, Epic, (3, 1)),
                ItemTemplate::rect(keys::AEGIS, "Aegis", (15, 24), 3.1, 150, Legendary, (2, 2)),
                ItemTemplate::rect(
                    keys::DAWN_CANNON,
                    "Dawn Cannon",
                    (50, 0),
                    4.3,
                    170,
                    Legendary,
                    (3, 1),
                ),
            ],
            rarities: vec![
                RarityInfo { rarity: Common, label: "Common", multiplier: 1.0 },
                RarityInfo { rarity: Rare, label: "Rare", multiplier: 1.35 },
                RarityInfo { rarity: Epic, label: "Epic", multiplier: 1.75 },
                RarityInfo { rarity: Legendary, label: "Legendary", multiplier: 2.25 },
            ],
        }
    }

    /// A pack with custom templates and the default rarity table.
    pub fn with_templates(templates: Vec<ItemTemplate>) -> Self {
        Self { templates, ..Self::build_default() }
    }
}

impl Default for ContentPack {
    fn default() -> Self {
        Self::build_default()
    }
}

impl ItemCatalog for ContentPack {
    fn lookup(&self, key: &str) -> Option<&ItemTemplate> {
        self.templates.iter().find(|template| template.key == key)
    }

    fn rarity_multiplier(&self, rarity: Rarity) -> f64 {
        // Unknown rarities scale like common items.
        self.rarities.iter().find(|info| info.rarity == rarity).map_or(1.0, |info| info.multiplier)
    }

    fn templates(&self) -> &[ItemTemplate] {
        &self.templates
    }
}
