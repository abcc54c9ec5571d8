use crate::validate::{Checker, SchemaViolation, Validate};
use serde::{Deserialize, Serialize};

/// Qualitative rarity tier of an owned card, distinct from its numeric power.
///
/// Derived from the 1-based index returned by the weighted rank pick: the
/// lowest indices are the common tiers, the tail indices the rare ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Rank {
    C,
    B,
    A,
    S,
    #[strum(serialize = "S+")]
    SPlus,
}

impl Rank {
    /// Map a 1-based weighted-pick index onto a tier label.
    ///
    /// The weight tables in the catalog put the heaviest weights first, so
    /// low indices land on the common tiers.
    pub fn from_tier(tier: usize) -> Rank {
        match tier {
            0..=3 => Rank::C,
            4..=5 => Rank::B,
            6..=7 => Rank::A,
            8 => Rank::S,
            _ => Rank::SPlus,
        }
    }
}

/// Immutable base-card definition. Authored as RON content, never mutated by
/// gameplay code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCard {
    pub id: String,
    pub name: String,
    /// Base power before the per-claim roll. Content range is 1000-20000.
    pub base_power: u32,
    /// 1-3 category tags (e.g. elemental types).
    pub categories: Vec<String>,
    /// Configured rank of the template; cards at rank 4 and above roll a
    /// tighter power spread than the lower ranks.
    pub rank: u8,
    /// Weight table for the claim-time tier pick, heaviest first.
    pub rarity_weights: Vec<f64>,
}

/// Per-category combat attributes consulted during damage resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub name: String,
    /// Defender categories this category's moves are resisted by.
    pub resistance: Vec<String>,
    /// Defender categories this category's moves are amplified against.
    pub weakness: Vec<String>,
    /// Flavor counterpart of `weakness`; kept for content parity.
    pub strength: String,
    /// Integer percent chance of a critical hit for moves of this category.
    pub crit_chance: u8,
    /// Damage multiplier applied on a critical hit.
    pub crit_damage: f64,
    /// Damage multiplier applied when the attacker's card carries this category.
    pub dmg: f64,
}

/// A player-specific, power-rolled, move-resolved instantiation of a catalog
/// card. Created once at claim time; power and move set are frozen afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedCard {
    pub id: String,
    pub catalog_card_id: String,
    pub name: String,
    /// Rolled power; always >= 1000 and a multiple of 50.
    pub real_power: u32,
    pub rank: Rank,
    /// Exactly 3 owned-move ids after instantiation, in resolution order.
    pub move_ids: Vec<String>,
    /// Whether the card is committed to a loadout.
    pub in_group: bool,
    pub owner_id: String,
    pub guild_id: String,
}

impl Validate for CatalogCard {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("CatalogCard");
        c.require(!self.id.is_empty(), "id", "must not be empty");
        c.require(!self.name.is_empty(), "name", "must not be empty");
        c.require(
            (1000..=20000).contains(&self.base_power),
            "base_power",
            "must be within 1000-20000",
        );
        c.require(
            (1..=3).contains(&self.categories.len()),
            "categories",
            "must carry 1-3 tags",
        );
        c.require(
            !self.rarity_weights.is_empty(),
            "rarity_weights",
            "must not be empty",
        );
        c.require(
            self.rarity_weights.iter().all(|w| *w >= 0.0),
            "rarity_weights",
            "weights must be non-negative",
        );
        c.finish()
    }
}

impl Validate for CategoryProfile {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("CategoryProfile");
        c.require(!self.name.is_empty(), "name", "must not be empty");
        c.require(self.crit_chance <= 100, "crit_chance", "must be a percent");
        c.require(self.crit_damage >= 1.0, "crit_damage", "must not reduce damage");
        c.require(self.dmg > 0.0, "dmg", "must be positive");
        c.finish()
    }
}

impl Validate for OwnedCard {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("OwnedCard");
        c.require(!self.id.is_empty(), "id", "must not be empty");
        c.require(!self.owner_id.is_empty(), "owner_id", "must not be empty");
        c.require(!self.guild_id.is_empty(), "guild_id", "must not be empty");
        c.require(self.real_power >= 1000, "real_power", "must be at least 1000");
        c.require(
            self.real_power % 50 == 0,
            "real_power",
            "must be a multiple of 50",
        );
        c.require(self.move_ids.len() == 3, "move_ids", "must hold exactly 3 moves");
        c.finish()
    }
}
