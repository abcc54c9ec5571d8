use crate::validate::{Checker, SchemaViolation, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of a PvP battle.
///
/// Transitions are monotone: `Pending` may move to `OnGoing`, `Declined` or
/// `Expired`; `OnGoing` may move to `Finished`, `Forfeit` or `Failed`; every
/// other state is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleStatus {
    Pending,
    OnGoing,
    Finished,
    Forfeit,
    Failed,
    Declined,
    Expired,
}

impl BattleStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BattleStatus::Pending | BattleStatus::OnGoing)
    }

    /// Whether a transition to `next` respects the state machine.
    pub fn can_transition_to(self, next: BattleStatus) -> bool {
        match self {
            BattleStatus::Pending => matches!(
                next,
                BattleStatus::OnGoing
                    | BattleStatus::Declined
                    | BattleStatus::Expired
                    | BattleStatus::Failed
            ),
            BattleStatus::OnGoing => matches!(
                next,
                BattleStatus::Finished | BattleStatus::Forfeit | BattleStatus::Failed
            ),
            _ => false,
        }
    }
}

/// One PvP encounter between two players within a guild scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    pub id: String,
    pub guild_id: String,
    pub challenger_id: String,
    pub challenged_id: String,
    pub status: BattleStatus,
    /// Epoch milliseconds.
    pub created_at: u64,
    pub finished_at: Option<u64>,
    pub current_turn_player_id: Option<String>,
    pub challenger_card_ids: Vec<String>,
    pub challenged_card_ids: Vec<String>,
    /// Remaining power per selected card, parallel to the card id lists.
    pub challenger_powers: Vec<u32>,
    pub challenged_powers: Vec<u32>,
    pub turn_count: u32,
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
}

impl Battle {
    pub fn is_participant(&self, player_id: &str) -> bool {
        self.challenger_id == player_id || self.challenged_id == player_id
    }

    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if self.challenger_id == player_id {
            Some(&self.challenged_id)
        } else if self.challenged_id == player_id {
            Some(&self.challenger_id)
        } else {
            None
        }
    }
}

/// Per-move usage counter inside a turn record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveUsage {
    pub move_id: String,
    pub count: u32,
}

/// Immutable record of one resolved turn. Child of a battle; `turn_number`
/// is 1-based and unique per battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub battle_id: String,
    pub player_id: String,
    pub turn_number: u32,
    pub move_usage: Vec<MoveUsage>,
    pub damage_dealt: u32,
    pub healing_done: u32,
    pub card_switches: u32,
    pub focus_completed: bool,
    pub special_triggered: bool,
    /// Wall-clock time the player took to choose; pacing metadata only.
    pub duration_ms: u64,
}

/// Cumulative per-(battle, player) statistics. Counters only ever grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub battle_id: String,
    pub player_id: String,
    pub total_turns: u32,
    pub total_damage_dealt: u64,
    pub total_healing_done: u64,
    pub total_card_switches: u32,
    pub total_focus_completed: u32,
    pub total_special_triggered: u32,
    pub average_turn_duration_ms: f64,
    pub move_frequency: HashMap<String, u32>,
}

impl TelemetryRecord {
    pub fn new(battle_id: String, player_id: String) -> Self {
        TelemetryRecord {
            battle_id,
            player_id,
            total_turns: 0,
            total_damage_dealt: 0,
            total_healing_done: 0,
            total_card_switches: 0,
            total_focus_completed: 0,
            total_special_triggered: 0,
            average_turn_duration_ms: 0.0,
            move_frequency: HashMap::new(),
        }
    }
}

impl Validate for Battle {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("Battle");
        c.require(!self.id.is_empty(), "id", "must not be empty");
        c.require(!self.guild_id.is_empty(), "guild_id", "must not be empty");
        c.require(
            !self.challenger_id.is_empty() && !self.challenged_id.is_empty(),
            "challenger_id",
            "both participants are required",
        );
        c.require(
            self.challenger_id != self.challenged_id,
            "challenged_id",
            "a player cannot battle themselves",
        );
        c.require(
            self.challenger_powers.len() == self.challenger_card_ids.len(),
            "challenger_powers",
            "must stay parallel to the card list",
        );
        c.require(
            self.challenged_powers.len() == self.challenged_card_ids.len(),
            "challenged_powers",
            "must stay parallel to the card list",
        );
        c.require(
            self.finished_at.is_none() || self.status.is_terminal(),
            "finished_at",
            "only terminal battles carry a finish time",
        );
        c.finish()
    }
}

impl Validate for TurnRecord {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("TurnRecord");
        c.require(!self.battle_id.is_empty(), "battle_id", "must not be empty");
        c.require(!self.player_id.is_empty(), "player_id", "must not be empty");
        c.require(self.turn_number >= 1, "turn_number", "turns are 1-based");
        c.finish()
    }
}

impl Validate for TelemetryRecord {
    fn validate(&self) -> Result<(), SchemaViolation> {
        let mut c = Checker::new("TelemetryRecord");
        c.require(!self.battle_id.is_empty(), "battle_id", "must not be empty");
        c.require(!self.player_id.is_empty(), "player_id", "must not be empty");
        c.require(
            self.average_turn_duration_ms >= 0.0,
            "average_turn_duration_ms",
            "must be non-negative",
        );
        c.finish()
    }
}
