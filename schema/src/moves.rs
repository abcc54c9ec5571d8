use crate::validate::{Checker, SchemaViolation, Validate};
use serde::{Deserialize, Serialize};

/// Broad behavior class of a move; drives the per-turn bookkeeping flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum MoveKind {
    Attack,
    Heal,
    Focus,
    Special,
}

/// Direction of a stat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    Buff,
    Debuff,
}

/// Stat a modifier attaches to.
///
/// Attack modifiers scale damage the side deals, defense modifiers scale
/// damage the side takes, healing modifiers scale restored power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierStat {
    Attack,
    Defense,
    Healing,
}

/// A (kind, target, value) triple carried by a move. `value` is a percentage
/// point adjustment: a 25-point Attack buff multiplies outgoing damage by 1.25
/// for the move's duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub stat: ModifierStat,
    pub value: f64,
}

/// Condition gating a move's alternate form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FormCondition {
    /// Active while the attacker's card sits below this percent of its
    /// rolled power.
    PowerBelowPercent(u8),
}

/// Nested alternate form of a move, activated while its condition holds.
/// When the parent move's modifiers expire, `undo_modifiers` are applied to
/// restore baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementForm {
    pub condition: FormCondition,
    pub base_damage: u32,
    pub special_damage: u32,
    pub undo_modifiers: Vec<Modifier>,
}

/// Immutable move definition from the content files. Moves live in named
/// pools: a pool keyed by a card name, a category name, or the shared
/// "Basic" fallback pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: MoveKind,
    /// Category the move belongs to; resolved against `CategoryProfile` for
    /// weakness/resistance/crit handling. Empty for untyped basics.
    pub category: String,
    pub base_damage: u32,
    /// Damage (or heal amount, for Heal moves) of the special branch.
    pub special_damage: u32,
    /// Attacker-side multiplicative adjustment, 1.0 = neutral.
    pub own_modifier: f64,
    /// Defender-side multiplicative adjustment, 1.0 = neutral.
    pub other_modifier: f64,
    /// Turns any carried modifiers stay active.
    pub duration: u8,
    pub modifiers: Vec<Modifier>,
    pub requirement_form: Option<RequirementForm>,
}

/// Per-owned-card clone of a `MoveData` with its own identity and level.
/// New moves require a new owned card; instances are never re-rolled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedMove {
    pub id: String,
    pub move_id: String,
    pub owned_card_id: String,
    pub level: u8,
    pub data: MoveData,
}

impl Validate for MoveData {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("MoveData");
        c.require(!self.id.is_empty(), "id", "must not be empty");
        c.require(!self.name.is_empty(), "name", "must not be empty");
        c.require(self.own_modifier > 0.0, "own_modifier", "must be positive");
        c.require(self.other_modifier > 0.0, "other_modifier", "must be positive");
        c.require(
            self.modifiers.is_empty() || self.duration > 0,
            "duration",
            "modifier-carrying moves need a duration",
        );
        c.finish()
    }
}

impl Validate for OwnedMove {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("OwnedMove");
        c.require(!self.id.is_empty(), "id", "must not be empty");
        c.require(!self.move_id.is_empty(), "move_id", "must not be empty");
        c.require(
            !self.owned_card_id.is_empty(),
            "owned_card_id",
            "must not be empty",
        );
        c.require(self.level >= 1, "level", "levels are 1-based");
        if let Err(inner) = self.data.validate() {
            c.require(false, "data", &inner.to_string());
        }
        c.finish()
    }
}
