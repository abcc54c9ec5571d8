//! Turn resolution and damage computation.
//!
//! The engine is pure over `CombatState`: the service feeds it one action at
//! a time and an injected RNG, and gets back a `TurnOutcome` plus the event
//! bus for the UI collaborator. Persistence and notifications happen a layer
//! up.

use crate::battle::state::{
    modifier_factor, ActiveModifier, BattleEvent, CombatState, EventBus, PlayerTarget, TurnAction,
};
use crate::catalog::Catalog;
use crate::errors::{ArenaResult, ValidationError};
use rand::Rng;
use schema::{FormCondition, Modifier, ModifierKind, ModifierStat, MoveData, MoveKind};

/// Fixed amplification when the defender's category sits in the move
/// category's weakness list.
pub const WEAKNESS_FACTOR: f64 = 1.5;
/// Fixed reduction when the defender's category sits in the resistance list.
pub const RESISTANCE_FACTOR: f64 = 0.5;

/// What one resolved turn did, for the turn record and telemetry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnOutcome {
    pub move_id: Option<String>,
    pub damage_dealt: u32,
    pub healing_done: u32,
    pub card_switched: bool,
    pub focus_completed: bool,
    pub special_triggered: bool,
    pub knocked_out: bool,
    pub winner: Option<PlayerTarget>,
}

/// Resolve one turn for `actor`. Advances the turn counter even for a pass,
/// per the timeout policy.
pub fn resolve_turn<R: Rng + ?Sized>(
    state: &mut CombatState,
    catalog: &Catalog,
    actor: PlayerTarget,
    action: &TurnAction,
    rng: &mut R,
) -> ArenaResult<(TurnOutcome, EventBus)> {
    // Rejected actions leave the state untouched, so validate before the
    // modifier tick mutates anything.
    validate_action(state, actor, action)?;

    let mut bus = EventBus::new();
    bus.push(BattleEvent::TurnStarted {
        turn_number: state.turn_number,
    });

    tick_modifiers(state, actor, &mut bus);

    let mut outcome = TurnOutcome::default();
    match action {
        TurnAction::Pass => {
            bus.push(BattleEvent::TurnPassed {
                player_id: state.side(actor).player_id.clone(),
            });
        }
        TurnAction::SwitchCard { card_index } => {
            resolve_switch(state, actor, *card_index, &mut outcome, &mut bus)?;
        }
        TurnAction::UseMove { move_index } => {
            resolve_move(state, catalog, actor, *move_index, rng, &mut outcome, &mut bus)?;
        }
    }

    if let Some(winner) = state.winner() {
        outcome.winner = Some(winner);
        bus.push(BattleEvent::BattleEnded {
            winner_id: Some(state.side(winner).player_id.clone()),
        });
    }

    state.turn_number += 1;
    bus.push(BattleEvent::TurnEnded);

    Ok((outcome, bus))
}

/// Pure validity check for an action against the current combat state.
fn validate_action(
    state: &CombatState,
    actor: PlayerTarget,
    action: &TurnAction,
) -> ArenaResult<()> {
    match action {
        TurnAction::Pass => Ok(()),
        TurnAction::SwitchCard { card_index } => {
            let side = state.side(actor);
            let target = side.cards.get(*card_index).ok_or_else(|| {
                ValidationError::InvalidTarget(format!("no card in slot {}", card_index))
            })?;
            if target.is_out() {
                return Err(ValidationError::InvalidTarget(
                    "cannot switch to a knocked-out card".to_string(),
                )
                .into());
            }
            if *card_index == side.active_index {
                return Err(
                    ValidationError::InvalidTarget("card is already active".to_string()).into(),
                );
            }
            Ok(())
        }
        TurnAction::UseMove { move_index } => {
            let attacker = state.side(actor).active_card().ok_or_else(|| {
                ValidationError::InvalidTarget("attacker has no standing card".to_string())
            })?;
            let owned_move = attacker.moves.get(*move_index).ok_or_else(|| {
                ValidationError::InvalidTarget(format!("no move in slot {}", move_index))
            })?;
            let targets_opponent = matches!(
                owned_move.data.kind,
                MoveKind::Attack | MoveKind::Special
            );
            if targets_opponent && state.side(actor.opponent()).active_card().is_none() {
                return Err(ValidationError::InvalidTarget(
                    "opponent has no standing card".to_string(),
                )
                .into());
            }
            Ok(())
        }
    }
}

/// Decrement the actor side's modifier durations; expired modifiers are
/// removed (restoring baseline) and their undo-modifiers applied.
fn tick_modifiers(state: &mut CombatState, actor: PlayerTarget, bus: &mut EventBus) {
    let player_id = state.side(actor).player_id.clone();
    let side = state.side_mut(actor);

    let mut undos: Vec<(String, Vec<Modifier>)> = Vec::new();
    side.modifiers.retain_mut(|modifier| {
        modifier.turns_remaining = modifier.turns_remaining.saturating_sub(1);
        if modifier.turns_remaining == 0 {
            undos.push((modifier.source_move.clone(), modifier.undo.clone()));
            false
        } else {
            true
        }
    });

    for (source_move, undo) in undos {
        bus.push(BattleEvent::ModifierExpired {
            player_id: player_id.clone(),
            source_move: source_move.clone(),
        });
        for modifier in undo {
            apply_modifier(side, &modifier, 1, Vec::new(), &source_move, &player_id, bus);
        }
    }
}

fn apply_modifier(
    side: &mut crate::battle::state::SideState,
    modifier: &Modifier,
    turns: u8,
    undo: Vec<Modifier>,
    source_move: &str,
    player_id: &str,
    bus: &mut EventBus,
) {
    let factor = modifier_factor(modifier);
    side.modifiers.push(ActiveModifier {
        stat: modifier.stat,
        factor,
        turns_remaining: turns,
        undo,
        source_move: source_move.to_string(),
    });
    bus.push(BattleEvent::ModifierApplied {
        player_id: player_id.to_string(),
        stat: modifier.stat,
        factor,
        turns,
    });
}

fn resolve_switch(
    state: &mut CombatState,
    actor: PlayerTarget,
    card_index: usize,
    outcome: &mut TurnOutcome,
    bus: &mut EventBus,
) -> ArenaResult<()> {
    let side = state.side_mut(actor);
    let target = side.cards.get(card_index).ok_or_else(|| {
        ValidationError::InvalidTarget(format!("no card in slot {}", card_index))
    })?;
    if target.is_out() {
        return Err(
            ValidationError::InvalidTarget("cannot switch to a knocked-out card".to_string())
                .into(),
        );
    }
    if card_index == side.active_index {
        return Err(ValidationError::InvalidTarget("card is already active".to_string()).into());
    }

    side.active_index = card_index;
    outcome.card_switched = true;
    bus.push(BattleEvent::CardSwitched {
        player_id: side.player_id.clone(),
        card_name: side.cards[card_index].card.name.clone(),
    });
    Ok(())
}

fn resolve_move<R: Rng + ?Sized>(
    state: &mut CombatState,
    catalog: &Catalog,
    actor: PlayerTarget,
    move_index: usize,
    rng: &mut R,
    outcome: &mut TurnOutcome,
    bus: &mut EventBus,
) -> ArenaResult<()> {
    // Snapshot the attacker's side before any defender mutation.
    let attacker_side = state.side(actor);
    let attacker = attacker_side.active_card().ok_or_else(|| {
        ValidationError::InvalidTarget("attacker has no standing card".to_string())
    })?;
    let owned_move = attacker.moves.get(move_index).ok_or_else(|| {
        ValidationError::InvalidTarget(format!("no move in slot {}", move_index))
    })?;

    let move_data = owned_move.data.clone();
    let attacker_name = attacker.card.name.clone();
    let attacker_categories = attacker.categories.clone();
    let attacker_player = attacker_side.player_id.clone();
    let attack_factor = attacker_side.stat_factor(ModifierStat::Attack);
    let heal_factor = attacker_side.stat_factor(ModifierStat::Healing);

    // Conditional branch: the alternate form takes over while the attacker's
    // card sits below the stated fraction of its rolled power.
    let form_active = move_data.requirement_form.as_ref().is_some_and(|form| {
        let FormCondition::PowerBelowPercent(percent) = form.condition;
        (attacker.remaining_power as u64) * 100
            < (attacker.card.real_power as u64) * percent as u64
    });
    let (base_damage, special_damage) = match (&move_data.requirement_form, form_active) {
        (Some(form), true) => (form.base_damage, form.special_damage),
        _ => (move_data.base_damage, move_data.special_damage),
    };

    outcome.move_id = Some(move_data.id.clone());
    bus.push(BattleEvent::MoveUsed {
        player_id: attacker_player.clone(),
        card_name: attacker_name.clone(),
        move_name: move_data.name.clone(),
    });
    if form_active {
        outcome.special_triggered = true;
        bus.push(BattleEvent::FormTriggered {
            card_name: attacker_name.clone(),
            move_name: move_data.name.clone(),
        });
    }

    match move_data.kind {
        MoveKind::Heal => {
            let amount = (special_damage.max(base_damage) as f64 * heal_factor).floor() as u32;
            let card = state.side_mut(actor).active_card_mut().ok_or_else(|| {
                ValidationError::InvalidTarget("attacker has no standing card".to_string())
            })?;
            let headroom = card.card.real_power - card.remaining_power;
            let healed = amount.min(headroom);
            card.remaining_power += healed;
            outcome.healing_done = healed;
            bus.push(BattleEvent::CardHealed {
                card_name: attacker_name.clone(),
                amount: healed,
                new_power: card.remaining_power,
            });
        }
        MoveKind::Focus => {
            outcome.focus_completed = true;
            bus.push(BattleEvent::FocusCompleted {
                card_name: attacker_name.clone(),
            });
        }
        MoveKind::Attack | MoveKind::Special => {
            let defender_target = actor.opponent();
            let defender_side = state.side(defender_target);
            let defender = defender_side.active_card().ok_or_else(|| {
                ValidationError::InvalidTarget("opponent has no standing card".to_string())
            })?;
            let defender_categories = defender.categories.clone();
            let defender_name = defender.card.name.clone();
            let defender_player = defender_side.player_id.clone();
            let defense_factor = defender_side.stat_factor(ModifierStat::Defense);

            let use_special = move_data.kind == MoveKind::Special && special_damage > 0;
            if use_special {
                outcome.special_triggered = true;
            }
            let mut damage = if use_special {
                special_damage as f64
            } else {
                base_damage as f64
            };

            if let Some(profile) = catalog.category(&move_data.category) {
                if attacker_categories.iter().any(|c| *c == move_data.category) {
                    damage *= profile.dmg;
                }

                let effectiveness = if defender_categories
                    .iter()
                    .any(|c| profile.weakness.contains(c))
                {
                    WEAKNESS_FACTOR
                } else if defender_categories
                    .iter()
                    .any(|c| profile.resistance.contains(c))
                {
                    RESISTANCE_FACTOR
                } else {
                    1.0
                };
                if effectiveness != 1.0 {
                    damage *= effectiveness;
                    bus.push(BattleEvent::CategoryEffectiveness {
                        factor: effectiveness,
                    });
                }

                if profile.crit_chance > 0
                    && rng.random_range(1..=100u32) <= profile.crit_chance as u32
                {
                    damage *= profile.crit_damage;
                    bus.push(BattleEvent::CriticalHit {
                        move_name: move_data.name.clone(),
                    });
                }
            }

            damage *= move_data.own_modifier * move_data.other_modifier;
            damage *= attack_factor;
            damage /= defense_factor;
            let damage = damage.floor().max(0.0) as u32;

            let defender_side = state.side_mut(defender_target);
            let card = defender_side.active_card_mut().ok_or_else(|| {
                ValidationError::InvalidTarget("opponent has no standing card".to_string())
            })?;
            card.remaining_power = card.remaining_power.saturating_sub(damage);
            let remaining = card.remaining_power;
            outcome.damage_dealt = damage;
            bus.push(BattleEvent::DamageDealt {
                target_card: defender_name.clone(),
                damage,
                remaining_power: remaining,
            });

            if remaining == 0 {
                outcome.knocked_out = true;
                bus.push(BattleEvent::CardKnockedOut {
                    player_id: defender_player.clone(),
                    card_name: defender_name.clone(),
                });
                // The defender auto-fields their next standing card.
                if defender_side.advance_to_next_standing() {
                    let next = defender_side.cards[defender_side.active_index].card.name.clone();
                    bus.push(BattleEvent::CardSwitched {
                        player_id: defender_player,
                        card_name: next,
                    });
                }
            }
        }
    }

    // Duration-based buffs land on the caster's side, debuffs on the
    // opponent's. A requirement form's undo rides on the first one.
    if move_data.duration > 0 && !move_data.modifiers.is_empty() {
        let undo = match (&move_data.requirement_form, form_active) {
            (Some(form), true) => form.undo_modifiers.clone(),
            _ => Vec::new(),
        };
        let mut undo = Some(undo);
        for modifier in &move_data.modifiers {
            let target = match modifier.kind {
                ModifierKind::Buff => actor,
                ModifierKind::Debuff => actor.opponent(),
            };
            let player_id = state.side(target).player_id.clone();
            apply_modifier(
                state.side_mut(target),
                modifier,
                move_data.duration,
                undo.take().unwrap_or_default(),
                &move_data.name,
                &player_id,
                bus,
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::state::{ActiveCard, SideState};
    use crate::errors::ArenaError;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use schema::{
        CategoryProfile, Modifier, ModifierKind, OwnedCard, OwnedMove, Rank, RequirementForm,
    };
    use std::collections::HashMap;

    fn move_data(id: &str, kind: MoveKind, category: &str, base: u32) -> MoveData {
        MoveData {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            kind,
            category: category.to_string(),
            base_damage: base,
            special_damage: 0,
            own_modifier: 1.0,
            other_modifier: 1.0,
            duration: 0,
            modifiers: vec![],
            requirement_form: None,
        }
    }

    fn active_card(name: &str, power: u32, categories: Vec<&str>, moves: Vec<MoveData>) -> ActiveCard {
        let card_id = format!("owned-{}", name);
        let moves: Vec<OwnedMove> = moves
            .into_iter()
            .enumerate()
            .map(|(i, data)| OwnedMove {
                id: format!("{}-slot-{}", card_id, i),
                move_id: data.id.clone(),
                owned_card_id: card_id.clone(),
                level: 1,
                data,
            })
            .collect();
        ActiveCard {
            card: OwnedCard {
                id: card_id.clone(),
                catalog_card_id: format!("catalog-{}", name),
                name: name.to_string(),
                real_power: power,
                rank: Rank::C,
                move_ids: moves.iter().map(|m| m.id.clone()).collect(),
                in_group: true,
                owner_id: "owner".to_string(),
                guild_id: "guild".to_string(),
            },
            categories: categories.into_iter().map(String::from).collect(),
            moves,
            remaining_power: power,
        }
    }

    fn category(name: &str, weakness: Vec<&str>, crit_chance: u8) -> CategoryProfile {
        CategoryProfile {
            name: name.to_string(),
            resistance: vec![],
            weakness: weakness.into_iter().map(String::from).collect(),
            strength: String::new(),
            crit_chance,
            crit_damage: 2.0,
            dmg: 1.0,
        }
    }

    fn test_catalog(categories: Vec<CategoryProfile>) -> Catalog {
        Catalog::from_parts(vec![], categories, HashMap::new()).unwrap()
    }

    fn two_side_state(
        challenger_cards: Vec<ActiveCard>,
        challenged_cards: Vec<ActiveCard>,
    ) -> CombatState {
        CombatState::new(
            "battle-1".to_string(),
            SideState::new("alice".to_string(), challenger_cards),
            SideState::new("bob".to_string(), challenged_cards),
        )
    }

    #[test]
    fn weakness_match_amplifies_by_fixed_factor() {
        // Fire hits a Grass card: 500 base swells to 750.
        let catalog = test_catalog(vec![category("Fire", vec!["Grass"], 0)]);
        let attacker = active_card(
            "Cinder Golem",
            4000,
            vec!["Earth"],
            vec![move_data("ember", MoveKind::Attack, "Fire", 500)],
        );
        let defender = active_card("Moss Beast", 4000, vec!["Grass"], vec![]);
        let mut state = two_side_state(vec![attacker], vec![defender]);
        let mut rng = StdRng::seed_from_u64(1);

        let (outcome, bus) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 750);
        assert!(bus.events().iter().any(|e| matches!(
            e,
            BattleEvent::CategoryEffectiveness { factor } if *factor == WEAKNESS_FACTOR
        )));
        assert_eq!(state.side(PlayerTarget::Challenged).cards[0].remaining_power, 3250);
        assert_eq!(state.turn_number, 2);
    }

    #[test]
    fn resistance_match_halves_damage() {
        let mut profile = category("Water", vec![], 0);
        profile.resistance = vec!["Stone".to_string()];
        let catalog = test_catalog(vec![profile]);
        let attacker = active_card(
            "Tidal Drake",
            4000,
            vec![],
            vec![move_data("geyser", MoveKind::Attack, "Water", 600)],
        );
        let defender = active_card("Wall", 4000, vec!["Stone"], vec![]);
        let mut state = two_side_state(vec![attacker], vec![defender]);
        let mut rng = StdRng::seed_from_u64(2);

        let (outcome, _) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 300);
    }

    #[test]
    fn guaranteed_crit_multiplies_damage() {
        let catalog = test_catalog(vec![category("Fire", vec![], 100)]);
        let attacker = active_card(
            "Cinder Golem",
            4000,
            vec![],
            vec![move_data("ember", MoveKind::Attack, "Fire", 400)],
        );
        let defender = active_card("Dummy", 4000, vec![], vec![]);
        let mut state = two_side_state(vec![attacker], vec![defender]);
        let mut rng = StdRng::seed_from_u64(3);

        let (outcome, bus) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 800);
        assert!(bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::CriticalHit { .. })));
    }

    #[test]
    fn knockout_advances_defender_and_sets_winner_when_empty() {
        let catalog = test_catalog(vec![]);
        let attacker = active_card(
            "Bruiser",
            4000,
            vec![],
            vec![move_data("slam", MoveKind::Attack, "", 5000)],
        );
        let first = active_card("Fodder", 1000, vec![], vec![]);
        let second = active_card("Backup", 1000, vec![], vec![]);
        let mut state = two_side_state(vec![attacker], vec![first, second]);
        let mut rng = StdRng::seed_from_u64(4);

        let (outcome, _) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();
        assert!(outcome.knocked_out);
        assert!(outcome.winner.is_none());
        assert_eq!(state.side(PlayerTarget::Challenged).active_index, 1);

        // Second swing clears the loadout and ends the battle.
        let (outcome, bus) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.winner, Some(PlayerTarget::Challenger));
        assert!(bus.events().iter().any(|e| matches!(
            e,
            BattleEvent::BattleEnded { winner_id: Some(id) } if id == "alice"
        )));
    }

    #[test]
    fn heal_restores_up_to_rolled_power() {
        let catalog = test_catalog(vec![]);
        let mut healer = active_card(
            "Mender",
            4000,
            vec![],
            vec![MoveData {
                special_damage: 900,
                ..move_data("mend", MoveKind::Heal, "", 0)
            }],
        );
        healer.remaining_power = 3500;
        let defender = active_card("Dummy", 4000, vec![], vec![]);
        let mut state = two_side_state(vec![healer], vec![defender]);
        let mut rng = StdRng::seed_from_u64(5);

        let (outcome, _) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();

        // 900 would overshoot; the heal caps at the rolled power.
        assert_eq!(outcome.healing_done, 500);
        assert_eq!(state.side(PlayerTarget::Challenger).cards[0].remaining_power, 4000);
    }

    #[test]
    fn buffs_apply_then_expire_restoring_baseline() {
        let catalog = test_catalog(vec![]);
        let mut focus = move_data("war-cry", MoveKind::Focus, "", 0);
        focus.duration = 2;
        focus.modifiers = vec![Modifier {
            kind: ModifierKind::Buff,
            stat: ModifierStat::Attack,
            value: 50.0,
        }];
        let attacker = active_card(
            "Bruiser",
            4000,
            vec![],
            vec![focus, move_data("slam", MoveKind::Attack, "", 400)],
        );
        let defender = active_card("Dummy", 9000, vec![], vec![]);
        let mut state = two_side_state(vec![attacker], vec![defender]);
        let mut rng = StdRng::seed_from_u64(6);

        // Turn 1: focus applies a 2-turn +50% attack buff.
        let (outcome, _) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();
        assert!(outcome.focus_completed);
        assert_eq!(state.side(PlayerTarget::Challenger).modifiers.len(), 1);

        // Opponent passes.
        resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenged,
            &TurnAction::Pass,
            &mut rng,
        )
        .unwrap();

        // Turn 3: the buff has one tick left and boosts the slam.
        let (outcome, _) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 1 },
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.damage_dealt, 600);

        resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenged,
            &TurnAction::Pass,
            &mut rng,
        )
        .unwrap();

        // Turn 5: the buff expired at the start of the attacker's turn.
        let (outcome, bus) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 1 },
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.damage_dealt, 400);
        assert!(bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::ModifierExpired { .. })));
        assert!(state.side(PlayerTarget::Challenger).modifiers.is_empty());
    }

    #[test]
    fn requirement_form_activates_below_power_threshold() {
        let catalog = test_catalog(vec![]);
        let mut desperate = move_data("last-stand", MoveKind::Attack, "", 300);
        desperate.requirement_form = Some(RequirementForm {
            condition: FormCondition::PowerBelowPercent(50),
            base_damage: 900,
            special_damage: 0,
            undo_modifiers: vec![],
        });
        let mut attacker = active_card("Gladiator", 4000, vec![], vec![desperate]);
        attacker.remaining_power = 1000; // 25% of rolled power
        let defender = active_card("Dummy", 9000, vec![], vec![]);
        let mut state = two_side_state(vec![attacker], vec![defender]);
        let mut rng = StdRng::seed_from_u64(7);

        let (outcome, bus) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::UseMove { move_index: 0 },
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome.damage_dealt, 900);
        assert!(outcome.special_triggered);
        assert!(bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::FormTriggered { .. })));
    }

    #[test]
    fn switching_to_a_knocked_out_card_is_rejected() {
        let catalog = test_catalog(vec![]);
        let healthy = active_card("Healthy", 4000, vec![], vec![]);
        let mut downed = active_card("Downed", 4000, vec![], vec![]);
        downed.remaining_power = 0;
        let other = active_card("Other", 4000, vec![], vec![]);
        let mut state = two_side_state(vec![healthy, downed], vec![other]);
        let mut rng = StdRng::seed_from_u64(8);

        let err = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenger,
            &TurnAction::SwitchCard { card_index: 1 },
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArenaError::Validation(ValidationError::InvalidTarget(_))
        ));
        // Rejected actions change nothing, not even the turn counter.
        assert_eq!(state.turn_number, 1);
    }

    #[test]
    fn pass_still_advances_the_turn_counter() {
        let catalog = test_catalog(vec![]);
        let a = active_card("A", 4000, vec![], vec![]);
        let b = active_card("B", 4000, vec![], vec![]);
        let mut state = two_side_state(vec![a], vec![b]);
        let mut rng = StdRng::seed_from_u64(9);

        let (outcome, bus) = resolve_turn(
            &mut state,
            &catalog,
            PlayerTarget::Challenged,
            &TurnAction::Pass,
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome, TurnOutcome::default());
        assert_eq!(state.turn_number, 2);
        assert!(bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::TurnPassed { .. })));
    }
}
