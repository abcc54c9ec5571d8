//! Async battle service: the challenge lifecycle and the turn loop.
//!
//! Battles are advanced by independent event handlers (user interactions,
//! timer tasks), so every transition for a battle id runs under that id's
//! lock; there is no background thread per battle. Timeouts take the defined
//! default action (expire the challenge, auto-pass the turn) and stale
//! timers are no-ops.

use crate::battle::engine::{resolve_turn, TurnOutcome};
use crate::battle::state::{ActiveCard, CombatState, SideState, TurnAction};
use crate::battle::telemetry::TelemetryAggregator;
use crate::catalog::Catalog;
use crate::errors::{
    ArenaResult, ConflictError, ResourceError, TimeoutError, ValidationError,
};
use crate::store::Store;
use schema::{Battle, BattleStatus, MoveUsage, OwnedCard, TelemetryRecord, TurnRecord};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Tunable windows and loadout rules. The 60 second windows match the
/// reference behavior; tests shrink them.
#[derive(Debug, Clone)]
pub struct BattleConfig {
    pub response_window: Duration,
    pub turn_window: Duration,
    /// Cards each player must own and field.
    pub required_cards: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        BattleConfig {
            response_window: Duration::from_secs(60),
            turn_window: Duration::from_secs(60),
            required_cards: 4,
        }
    }
}

/// Messaging/UI collaborator. The engine pushes outcomes; rendering is the
/// collaborator's concern.
pub trait Notifier: Send + Sync {
    fn challenge_created(&self, _battle: &Battle) {}
    fn challenge_resolved(&self, _battle: &Battle, _accepted: bool) {}
    fn turn_resolved(&self, _battle: &Battle, _lines: &[String]) {}
    fn battle_ended(&self, _battle: &Battle, _outcome: &str) {}
}

/// Notifier that drops everything.
pub struct NullNotifier;

impl Notifier for NullNotifier {}

/// Pre-turn and in-turn runtime for one battle.
#[derive(Debug, Default)]
struct Session {
    picks: HashMap<String, Vec<ActiveCard>>,
    combat: Option<CombatState>,
}

pub struct BattleService<S: Store + 'static> {
    store: Arc<S>,
    catalog: Arc<Catalog>,
    notifier: Arc<dyn Notifier>,
    config: BattleConfig,
    /// One mutex per battle id; the unit of mutual exclusion. Entries are
    /// pruned once the battle is terminal; a late caller recreates one,
    /// finds the terminal status and stops.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Serializes challenge creation per guild. The per-battle lock cannot
    /// cover a battle that does not exist yet.
    creation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    sessions: Mutex<HashMap<String, Session>>,
    aggregator: Mutex<TelemetryAggregator>,
    /// Back-reference handed to spawned timer tasks.
    weak_self: Weak<BattleService<S>>,
}

impl<S: Store + 'static> BattleService<S> {
    pub fn new(
        store: Arc<S>,
        catalog: Arc<Catalog>,
        notifier: Arc<dyn Notifier>,
        config: BattleConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| BattleService {
            store,
            catalog,
            notifier,
            config,
            locks: Mutex::new(HashMap::new()),
            creation_locks: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            aggregator: Mutex::new(TelemetryAggregator::new()),
            weak_self: weak.clone(),
        })
    }

    /// Issue a challenge. The battle starts `Pending` and expires on its own
    /// if the challenged player never responds.
    pub async fn create_challenge(
        &self,
        guild_id: &str,
        challenger_id: &str,
        challenged_id: &str,
    ) -> ArenaResult<Battle> {
        if challenger_id == challenged_id {
            return Err(ValidationError::SelfChallenge.into());
        }

        // The duplicate/engagement checks and the insert must be atomic with
        // respect to other creations in the guild.
        let creation_lock = self.creation_lock_for(guild_id).await;
        let _guard = creation_lock.lock().await;

        if self
            .store
            .find_pending_between(guild_id, challenger_id, challenged_id)
            .await?
            .is_some()
        {
            return Err(ConflictError::DuplicatePending {
                challenger: challenger_id.to_string(),
                challenged: challenged_id.to_string(),
            }
            .into());
        }
        for player_id in [challenger_id, challenged_id] {
            if self.store.find_engagement(guild_id, player_id).await?.is_some() {
                return Err(ConflictError::AlreadyEngaged {
                    player_id: player_id.to_string(),
                }
                .into());
            }
        }

        let battle = Battle {
            id: Uuid::new_v4().to_string(),
            guild_id: guild_id.to_string(),
            challenger_id: challenger_id.to_string(),
            challenged_id: challenged_id.to_string(),
            status: BattleStatus::Pending,
            created_at: now_ms(),
            finished_at: None,
            current_turn_player_id: None,
            challenger_card_ids: vec![],
            challenged_card_ids: vec![],
            challenger_powers: vec![],
            challenged_powers: vec![],
            turn_count: 0,
            winner_id: None,
            loser_id: None,
        };
        self.store.insert_battle(battle.clone()).await?;
        tracing::info!(battle = %battle.id, %challenger_id, %challenged_id, "challenge created");
        self.notifier.challenge_created(&battle);

        if let Some(service) = self.weak_self.upgrade() {
            let battle_id = battle.id.clone();
            let window = self.config.response_window;
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                if let Err(err) = service.expire_challenge(&battle_id).await {
                    tracing::warn!(battle = %battle_id, %err, "challenge expiry failed");
                }
            });
        }

        Ok(battle)
    }

    /// Challenged player's answer. Accepting opens the card-selection phase.
    pub async fn respond(
        &self,
        battle_id: &str,
        responder_id: &str,
        accept: bool,
    ) -> ArenaResult<Battle> {
        let lock = self.lock_for(battle_id).await;
        let _guard = lock.lock().await;

        let mut battle = self.load_battle(battle_id).await?;
        if battle.challenged_id != responder_id {
            return Err(ValidationError::InvalidTarget(
                "only the challenged player may respond".to_string(),
            )
            .into());
        }
        match battle.status {
            BattleStatus::Pending => {}
            BattleStatus::Expired => return Err(TimeoutError::ResponseWindowElapsed.into()),
            from => return Err(ConflictError::StaleTransition { from }.into()),
        }

        if accept {
            battle.status = BattleStatus::OnGoing;
            self.store.update_battle(battle.clone()).await?;
            self.sessions
                .lock()
                .await
                .insert(battle.id.clone(), Session::default());
        } else {
            battle.status = BattleStatus::Declined;
            battle.finished_at = Some(now_ms());
            self.store.update_battle(battle.clone()).await?;
            self.release_battle(&battle.id).await;
        }
        tracing::info!(battle = %battle.id, accept, "challenge answered");
        self.notifier.challenge_resolved(&battle, accept);
        Ok(battle)
    }

    /// Timer path for an unanswered challenge. A no-op when the battle moved
    /// on before the timer fired. Returns whether the expiry was applied.
    pub async fn expire_challenge(&self, battle_id: &str) -> ArenaResult<bool> {
        let lock = self.lock_for(battle_id).await;
        let _guard = lock.lock().await;

        let mut battle = self.load_battle(battle_id).await?;
        if battle.status != BattleStatus::Pending {
            return Ok(false);
        }
        battle.status = BattleStatus::Expired;
        battle.finished_at = Some(now_ms());
        self.store.update_battle(battle.clone()).await?;
        self.release_battle(&battle.id).await;
        tracing::info!(battle = %battle.id, "challenge expired unanswered");
        self.notifier.challenge_resolved(&battle, false);
        Ok(true)
    }

    /// Lock in a player's loadout. When both sides are in, the turn loop
    /// starts with the challenger.
    pub async fn select_cards(
        &self,
        battle_id: &str,
        player_id: &str,
        card_ids: &[String],
    ) -> ArenaResult<()> {
        let lock = self.lock_for(battle_id).await;
        let _guard = lock.lock().await;

        let mut battle = self.load_battle(battle_id).await?;
        if battle.status != BattleStatus::OnGoing {
            return Err(ConflictError::StaleTransition {
                from: battle.status,
            }
            .into());
        }
        if !battle.is_participant(player_id) {
            return Err(ConflictError::NotInBattle {
                player_id: player_id.to_string(),
            }
            .into());
        }

        {
            let sessions = self.sessions.lock().await;
            let session = sessions.get(battle_id);
            if session.is_some_and(|s| s.combat.is_some() || s.picks.contains_key(player_id)) {
                return Err(ConflictError::CardsAlreadySelected {
                    player_id: player_id.to_string(),
                }
                .into());
            }
        }

        let required = self.config.required_cards;
        let owned = self
            .store
            .owned_cards_for_player(&battle.guild_id, player_id)
            .await?;
        if owned.len() < required || card_ids.len() < required {
            let actual = owned.len().min(card_ids.len());
            self.fail_battle(&mut battle, "a player could not field the required cards")
                .await?;
            return Err(ResourceError::InsufficientCards { required, actual }.into());
        }
        if card_ids.len() > required {
            return Err(ValidationError::InvalidTarget(format!(
                "select exactly {} cards",
                required
            ))
            .into());
        }
        let distinct: HashSet<&String> = card_ids.iter().collect();
        if distinct.len() != required {
            return Err(
                ValidationError::InvalidTarget("duplicate card in selection".to_string()).into(),
            );
        }

        let mut cards = Vec::with_capacity(required);
        for card_id in card_ids {
            let card = owned
                .iter()
                .find(|c| &c.id == card_id)
                .cloned()
                .ok_or_else(|| {
                    ValidationError::InvalidTarget(format!(
                        "card {} is not owned by {}",
                        card_id, player_id
                    ))
                })?;
            cards.push(self.build_active_card(card).await?);
        }

        let powers: Vec<u32> = cards.iter().map(|c| c.remaining_power).collect();
        if player_id == battle.challenger_id {
            battle.challenger_card_ids = card_ids.to_vec();
            battle.challenger_powers = powers;
        } else {
            battle.challenged_card_ids = card_ids.to_vec();
            battle.challenged_powers = powers;
        }

        let both_in = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.entry(battle_id.to_string()).or_default();
            session.picks.insert(player_id.to_string(), cards);
            if session.picks.len() == 2 {
                let challenger_cards = session.picks.remove(&battle.challenger_id);
                let challenged_cards = session.picks.remove(&battle.challenged_id);
                if let (Some(challenger_cards), Some(challenged_cards)) =
                    (challenger_cards, challenged_cards)
                {
                    session.combat = Some(CombatState::new(
                        battle.id.clone(),
                        SideState::new(battle.challenger_id.clone(), challenger_cards),
                        SideState::new(battle.challenged_id.clone(), challenged_cards),
                    ));
                }
                true
            } else {
                false
            }
        };

        if both_in {
            battle.current_turn_player_id = Some(battle.challenger_id.clone());
        }
        self.store.update_battle(battle.clone()).await?;
        tracing::info!(battle = %battle.id, %player_id, both_in, "cards selected");

        if both_in {
            self.spawn_turn_timer(battle.id, 0);
        }
        Ok(())
    }

    /// Submit the active player's move. Resolves the turn, records it,
    /// updates telemetry and flips the active player.
    pub async fn submit_move(
        &self,
        battle_id: &str,
        player_id: &str,
        action: TurnAction,
        duration_ms: u64,
    ) -> ArenaResult<TurnOutcome> {
        let lock = self.lock_for(battle_id).await;
        let _guard = lock.lock().await;

        let battle = self.load_battle(battle_id).await?;
        if battle.status != BattleStatus::OnGoing {
            return Err(ConflictError::StaleTransition {
                from: battle.status,
            }
            .into());
        }
        match &battle.current_turn_player_id {
            None => return Err(ConflictError::SelectionIncomplete.into()),
            Some(current) if current != player_id => {
                return Err(ConflictError::NotYourTurn {
                    player_id: player_id.to_string(),
                }
                .into())
            }
            Some(_) => {}
        }

        self.advance_locked(battle, player_id, action, duration_ms)
            .await
    }

    /// Timer path for a silent turn: applies the defined no-op move if the
    /// turn the timer watched is still the current one.
    pub async fn expire_turn(
        &self,
        battle_id: &str,
        observed_turns: u32,
    ) -> ArenaResult<bool> {
        let lock = self.lock_for(battle_id).await;
        let _guard = lock.lock().await;

        let battle = self.load_battle(battle_id).await?;
        if battle.status != BattleStatus::OnGoing || battle.turn_count != observed_turns {
            return Ok(false);
        }
        let Some(player_id) = battle.current_turn_player_id.clone() else {
            return Ok(false);
        };

        tracing::info!(battle = %battle.id, %player_id, "turn window elapsed, auto-passing");
        let window_ms = self.config.turn_window.as_millis() as u64;
        self.advance_locked(battle, &player_id, TurnAction::Pass, window_ms)
            .await?;
        Ok(true)
    }

    /// Forfeit the caller's ongoing battle in this guild.
    pub async fn forfeit(
        &self,
        guild_id: &str,
        player_id: &str,
    ) -> ArenaResult<Battle> {
        let engagement = self
            .store
            .find_engagement(guild_id, player_id)
            .await?
            .ok_or_else(|| ConflictError::NotInBattle {
                player_id: player_id.to_string(),
            })?;

        let lock = self.lock_for(&engagement.id).await;
        let _guard = lock.lock().await;

        // Reload under the lock; a racing transition may have finished it.
        let mut battle = self.load_battle(&engagement.id).await?;
        if battle.status != BattleStatus::OnGoing {
            return Err(ConflictError::NotInBattle {
                player_id: player_id.to_string(),
            }
            .into());
        }

        let winner = battle
            .opponent_of(player_id)
            .unwrap_or(&battle.challenger_id)
            .to_string();
        battle.winner_id = Some(winner.clone());
        battle.loser_id = Some(player_id.to_string());
        battle.status = BattleStatus::Forfeit;
        battle.finished_at = Some(now_ms());
        battle.current_turn_player_id = None;
        self.store.update_battle(battle.clone()).await?;
        self.release_battle(&battle.id).await;

        tracing::info!(battle = %battle.id, loser = %player_id, %winner, "battle forfeited");
        self.notifier
            .battle_ended(&battle, &format!("{} forfeited; {} wins!", player_id, winner));
        Ok(battle)
    }

    // --- internals ---

    async fn lock_for(&self, battle_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(battle_id.to_string())
            .or_default()
            .clone()
    }

    async fn creation_lock_for(&self, guild_id: &str) -> Arc<Mutex<()>> {
        self.creation_locks
            .lock()
            .await
            .entry(guild_id.to_string())
            .or_default()
            .clone()
    }

    /// Drop everything the service retains for a battle. Called when the
    /// battle reaches a terminal state so the maps stay bounded.
    async fn release_battle(&self, battle_id: &str) {
        self.locks.lock().await.remove(battle_id);
        self.sessions.lock().await.remove(battle_id);
        self.aggregator.lock().await.forget_battle(battle_id);
    }

    /// Put a taken combat state back into its session. The battle lock is
    /// held, so nothing observed the gap.
    async fn restore_combat(&self, battle_id: &str, combat: CombatState) {
        if let Some(session) = self.sessions.lock().await.get_mut(battle_id) {
            session.combat = Some(combat);
        }
    }

    #[cfg(test)]
    pub(crate) async fn retained_lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn retained_replay_keys(&self) -> usize {
        self.aggregator.lock().await.replay_key_count()
    }

    async fn load_battle(&self, battle_id: &str) -> ArenaResult<Battle> {
        self.store
            .find_battle(battle_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownBattle(battle_id.to_string()).into())
    }

    async fn build_active_card(&self, card: OwnedCard) -> ArenaResult<ActiveCard> {
        let mut moves = self.store.moves_for_card(&card.id).await?;
        // Stored unordered; restore the resolution order from the card.
        moves.sort_by_key(|m| {
            card.move_ids
                .iter()
                .position(|id| id == &m.id)
                .unwrap_or(usize::MAX)
        });
        let categories = self
            .catalog
            .card_by_name(&card.name)
            .map(|template| template.categories.clone())
            .unwrap_or_default();
        let remaining_power = card.real_power;
        Ok(ActiveCard {
            card,
            categories,
            moves,
            remaining_power,
        })
    }

    async fn fail_battle(&self, battle: &mut Battle, reason: &str) -> ArenaResult<()> {
        battle.status = BattleStatus::Failed;
        battle.finished_at = Some(now_ms());
        battle.current_turn_player_id = None;
        self.store.update_battle(battle.clone()).await?;
        self.release_battle(&battle.id).await;
        tracing::warn!(battle = %battle.id, reason, "battle failed");
        self.notifier.battle_ended(battle, reason);
        Ok(())
    }

    /// Resolve one turn for `player_id` and persist everything. The caller
    /// holds the battle lock and has already checked status and turn order.
    ///
    /// The combat state is taken out of the shared sessions map for the
    /// duration of the store writes; holding that map across awaits would
    /// serialize turns across unrelated battles.
    async fn advance_locked(
        &self,
        mut battle: Battle,
        player_id: &str,
        action: TurnAction,
        duration_ms: u64,
    ) -> ArenaResult<TurnOutcome> {
        let mut combat = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(&battle.id)
                .ok_or(ConflictError::SelectionIncomplete)?;
            session
                .combat
                .take()
                .ok_or(ConflictError::SelectionIncomplete)?
        };

        let resolved = match combat.side_of(player_id) {
            Some(actor) => {
                let mut rng = rand::rng();
                resolve_turn(&mut combat, &self.catalog, actor, &action, &mut rng)
            }
            None => Err(ConflictError::NotInBattle {
                player_id: player_id.to_string(),
            }
            .into()),
        };
        let (outcome, bus) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                self.restore_combat(&battle.id, combat).await;
                return Err(err);
            }
        };

        let turn_number = battle.turn_count + 1;
        let turn = TurnRecord {
            battle_id: battle.id.clone(),
            player_id: player_id.to_string(),
            turn_number,
            move_usage: outcome
                .move_id
                .iter()
                .map(|id| MoveUsage {
                    move_id: id.clone(),
                    count: 1,
                })
                .collect(),
            damage_dealt: outcome.damage_dealt,
            healing_done: outcome.healing_done,
            card_switches: outcome.card_switched as u32,
            focus_completed: outcome.focus_completed,
            special_triggered: outcome.special_triggered,
            duration_ms,
        };
        battle.turn_count = turn_number;
        battle.challenger_powers = combat.sides[0].remaining_powers();
        battle.challenged_powers = combat.sides[1].remaining_powers();
        battle.current_turn_player_id = battle.opponent_of(player_id).map(String::from);

        let finished = if let Some(winner) = outcome.winner {
            let winner_id = combat.side(winner).player_id.clone();
            let loser_id = combat.side(winner.opponent()).player_id.clone();
            battle.winner_id = Some(winner_id);
            battle.loser_id = Some(loser_id);
            battle.status = BattleStatus::Finished;
            battle.finished_at = Some(now_ms());
            battle.current_turn_player_id = None;
            true
        } else {
            false
        };
        if !finished {
            self.restore_combat(&battle.id, combat).await;
        }

        self.store.insert_turn(turn.clone()).await?;

        let mut telemetry = self
            .store
            .find_telemetry(&battle.id, player_id)
            .await?
            .unwrap_or_else(|| TelemetryRecord::new(battle.id.clone(), player_id.to_string()));
        if self
            .aggregator
            .lock()
            .await
            .record_turn(&mut telemetry, &turn)
        {
            self.store.upsert_telemetry(telemetry).await?;
        }

        self.store.update_battle(battle.clone()).await?;
        tracing::debug!(battle = %battle.id, %player_id, turn_number, damage = outcome.damage_dealt, "turn resolved");
        self.notifier.turn_resolved(&battle, &bus.formatted_lines());

        if finished {
            self.release_battle(&battle.id).await;
            let outcome_text = match &battle.winner_id {
                Some(winner) => format!("{} wins the battle!", winner),
                None => "The battle is over.".to_string(),
            };
            self.notifier.battle_ended(&battle, &outcome_text);
        } else {
            self.spawn_turn_timer(battle.id.clone(), turn_number);
        }

        Ok(outcome)
    }

    fn spawn_turn_timer(&self, battle_id: String, observed_turns: u32) {
        let Some(service) = self.weak_self.upgrade() else {
            return;
        };
        let window = self.config.turn_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            match service.expire_turn(&battle_id, observed_turns).await {
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(battle = %battle_id, %err, "turn expiry failed");
                }
            }
        });
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
