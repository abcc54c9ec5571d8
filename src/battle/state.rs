use schema::{Modifier, ModifierKind, ModifierStat, OwnedCard, OwnedMove};
use serde::{Deserialize, Serialize};

/// Side of a battle - provides type safety over raw indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerTarget {
    Challenger,
    Challenged,
}

impl PlayerTarget {
    pub fn to_index(self) -> usize {
        match self {
            PlayerTarget::Challenger => 0,
            PlayerTarget::Challenged => 1,
        }
    }

    pub fn opponent(self) -> PlayerTarget {
        match self {
            PlayerTarget::Challenger => PlayerTarget::Challenged,
            PlayerTarget::Challenged => PlayerTarget::Challenger,
        }
    }
}

/// A player's choice for one turn, supplied by the UI collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnAction {
    UseMove { move_index: usize },
    SwitchCard { card_index: usize },
    /// Defined default when the move window elapses: the turn still counts
    /// and the active player flips.
    Pass,
}

/// One selected card inside a running battle, with its combat-relevant
/// snapshot from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCard {
    pub card: OwnedCard,
    pub categories: Vec<String>,
    pub moves: Vec<OwnedMove>,
    pub remaining_power: u32,
}

impl ActiveCard {
    pub fn is_out(&self) -> bool {
        self.remaining_power == 0
    }
}

/// A buff or debuff currently attached to a side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveModifier {
    pub stat: ModifierStat,
    /// Multiplicative factor; 1.25 for a 25-point buff, 0.75 for a debuff.
    pub factor: f64,
    pub turns_remaining: u8,
    /// Applied when this modifier expires; carries a requirement form's
    /// undo-modifiers back onto the side.
    pub undo: Vec<Modifier>,
    pub source_move: String,
}

/// One side of the combat: the player's selected loadout plus transient
/// battle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideState {
    pub player_id: String,
    pub cards: Vec<ActiveCard>,
    pub active_index: usize,
    pub modifiers: Vec<ActiveModifier>,
}

impl SideState {
    pub fn new(player_id: String, cards: Vec<ActiveCard>) -> Self {
        SideState {
            player_id,
            cards,
            active_index: 0,
            modifiers: Vec::new(),
        }
    }

    pub fn active_card(&self) -> Option<&ActiveCard> {
        self.cards.get(self.active_index).filter(|c| !c.is_out())
    }

    pub fn active_card_mut(&mut self) -> Option<&mut ActiveCard> {
        self.cards
            .get_mut(self.active_index)
            .filter(|c| !c.is_out())
    }

    pub fn standing_cards(&self) -> usize {
        self.cards.iter().filter(|c| !c.is_out()).count()
    }

    /// Combined multiplicative factor of the active modifiers for a stat.
    pub fn stat_factor(&self, stat: ModifierStat) -> f64 {
        self.modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .fold(1.0, |acc, m| acc * m.factor)
    }

    /// Move the active slot to the next standing card. Returns false when
    /// the side has nothing left to field.
    pub fn advance_to_next_standing(&mut self) -> bool {
        if let Some(index) = self.cards.iter().position(|c| !c.is_out()) {
            self.active_index = index;
            true
        } else {
            false
        }
    }

    pub fn remaining_powers(&self) -> Vec<u32> {
        self.cards.iter().map(|c| c.remaining_power).collect()
    }
}

/// In-memory combat state for one ongoing battle. Built once both sides have
/// selected their cards; the battle document mirrors its power arrays after
/// every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub battle_id: String,
    pub sides: [SideState; 2],
    /// Number of the next turn to resolve, 1-based.
    pub turn_number: u32,
}

impl CombatState {
    pub fn new(battle_id: String, challenger: SideState, challenged: SideState) -> Self {
        CombatState {
            battle_id,
            sides: [challenger, challenged],
            turn_number: 1,
        }
    }

    pub fn side(&self, target: PlayerTarget) -> &SideState {
        &self.sides[target.to_index()]
    }

    pub fn side_mut(&mut self, target: PlayerTarget) -> &mut SideState {
        &mut self.sides[target.to_index()]
    }

    pub fn side_of(&self, player_id: &str) -> Option<PlayerTarget> {
        if self.sides[0].player_id == player_id {
            Some(PlayerTarget::Challenger)
        } else if self.sides[1].player_id == player_id {
            Some(PlayerTarget::Challenged)
        } else {
            None
        }
    }

    /// A side wins once the opponent has no standing cards left.
    pub fn winner(&self) -> Option<PlayerTarget> {
        match (
            self.sides[0].standing_cards(),
            self.sides[1].standing_cards(),
        ) {
            (0, _) => Some(PlayerTarget::Challenged),
            (_, 0) => Some(PlayerTarget::Challenger),
            _ => None,
        }
    }
}

/// Multiplicative factor for a buff/debuff value expressed in percentage
/// points. Debuffs never push a stat below 10% of baseline.
pub fn modifier_factor(modifier: &Modifier) -> f64 {
    match modifier.kind {
        ModifierKind::Buff => 1.0 + modifier.value / 100.0,
        ModifierKind::Debuff => (1.0 - modifier.value / 100.0).max(0.1),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn management
    TurnStarted {
        turn_number: u32,
    },
    TurnPassed {
        player_id: String,
    },
    TurnEnded,

    // Card actions
    MoveUsed {
        player_id: String,
        card_name: String,
        move_name: String,
    },
    CardSwitched {
        player_id: String,
        card_name: String,
    },

    // Damage and healing
    CriticalHit {
        move_name: String,
    },
    CategoryEffectiveness {
        factor: f64,
    },
    DamageDealt {
        target_card: String,
        damage: u32,
        remaining_power: u32,
    },
    CardHealed {
        card_name: String,
        amount: u32,
        new_power: u32,
    },
    CardKnockedOut {
        player_id: String,
        card_name: String,
    },

    // Modifiers
    ModifierApplied {
        player_id: String,
        stat: ModifierStat,
        factor: f64,
        turns: u8,
    },
    ModifierExpired {
        player_id: String,
        source_move: String,
    },
    FormTriggered {
        card_name: String,
        move_name: String,
    },
    FocusCompleted {
        card_name: String,
    },

    // Battle end
    BattleEnded {
        winner_id: Option<String>,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string for the UI collaborator.
    /// Returns None for silent bookkeeping events.
    pub fn format(&self) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_number } => {
                Some(format!("=== Turn {} ===", turn_number))
            }
            BattleEvent::TurnPassed { player_id } => {
                Some(format!("{} let the turn slip by.", player_id))
            }
            BattleEvent::TurnEnded => None,

            BattleEvent::MoveUsed {
                card_name,
                move_name,
                ..
            } => Some(format!("{} used {}!", card_name, move_name)),
            BattleEvent::CardSwitched {
                player_id,
                card_name,
            } => Some(format!("{} sent out {}!", player_id, card_name)),

            BattleEvent::CriticalHit { .. } => Some("A critical hit!".to_string()),
            BattleEvent::CategoryEffectiveness { factor } => match *factor {
                f if f > 1.0 => Some("It's super effective!".to_string()),
                f if f < 1.0 => Some("It's not very effective...".to_string()),
                _ => None,
            },
            BattleEvent::DamageDealt {
                target_card,
                damage,
                ..
            } => Some(format!("{} took {} damage!", target_card, damage)),
            BattleEvent::CardHealed {
                card_name, amount, ..
            } => Some(format!("{} recovered {} power!", card_name, amount)),
            BattleEvent::CardKnockedOut { card_name, .. } => {
                Some(format!("{} was knocked out!", card_name))
            }

            BattleEvent::ModifierApplied { stat, factor, .. } => {
                if *factor >= 1.0 {
                    Some(format!("{:?} rose!", stat))
                } else {
                    Some(format!("{:?} fell!", stat))
                }
            }
            BattleEvent::ModifierExpired { source_move, .. } => {
                Some(format!("The effect of {} wore off.", source_move))
            }
            BattleEvent::FormTriggered {
                card_name,
                move_name,
            } => Some(format!("{} unleashed the true form of {}!", card_name, move_name)),
            BattleEvent::FocusCompleted { card_name } => {
                Some(format!("{} is focusing!", card_name))
            }

            BattleEvent::BattleEnded { winner_id } => match winner_id {
                Some(winner) => Some(format!("{} has won the battle!", winner)),
                None => Some("The battle ended with no winner.".to_string()),
            },
        }
    }
}

/// Event bus collecting everything that happened while a turn resolved.
/// The service forwards the formatted lines to the messaging collaborator.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Human-readable lines for every non-silent event, in order.
    pub fn formatted_lines(&self) -> Vec<String> {
        self.events.iter().filter_map(|e| e.format()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}
