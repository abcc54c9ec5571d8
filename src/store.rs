//! Persistence collaborator.
//!
//! The engine talks to a document-style store through the `Store` trait and
//! never manages transactions itself; the per-battle serialization in the
//! service is the only mutual exclusion it relies on. Every write runs the
//! entity's declarative schema, so malformed documents never land.

use crate::errors::{ArenaResult, ConflictError};
use async_trait::async_trait;
use schema::{Battle, BattleStatus, OwnedCard, OwnedMove, TelemetryRecord, TurnRecord, Validate};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_owned_card(&self, card: OwnedCard) -> ArenaResult<()>;
    async fn find_owned_card(&self, id: &str) -> ArenaResult<Option<OwnedCard>>;
    async fn owned_cards_for_player(
        &self,
        guild_id: &str,
        owner_id: &str,
    ) -> ArenaResult<Vec<OwnedCard>>;

    async fn insert_owned_move(&self, owned_move: OwnedMove) -> ArenaResult<()>;
    async fn moves_for_card(&self, owned_card_id: &str) -> ArenaResult<Vec<OwnedMove>>;

    async fn insert_battle(&self, battle: Battle) -> ArenaResult<()>;
    async fn find_battle(&self, id: &str) -> ArenaResult<Option<Battle>>;
    /// Replace the battle document. Status changes must follow the state
    /// machine; a regressive write fails with `StaleTransition`.
    async fn update_battle(&self, battle: Battle) -> ArenaResult<()>;
    async fn find_pending_between(
        &self,
        guild_id: &str,
        challenger_id: &str,
        challenged_id: &str,
    ) -> ArenaResult<Option<Battle>>;
    /// The player's non-terminal battle in this guild, if any.
    async fn find_engagement(&self, guild_id: &str, player_id: &str)
        -> ArenaResult<Option<Battle>>;

    async fn insert_turn(&self, turn: TurnRecord) -> ArenaResult<()>;
    async fn turns_for_battle(&self, battle_id: &str) -> ArenaResult<Vec<TurnRecord>>;

    async fn upsert_telemetry(&self, telemetry: TelemetryRecord) -> ArenaResult<()>;
    async fn find_telemetry(
        &self,
        battle_id: &str,
        player_id: &str,
    ) -> ArenaResult<Option<TelemetryRecord>>;
}

#[derive(Debug, Default)]
struct Collections {
    owned_cards: HashMap<String, OwnedCard>,
    owned_moves: HashMap<String, OwnedMove>,
    battles: HashMap<String, Battle>,
    turns: Vec<TurnRecord>,
    telemetry: HashMap<(String, String), TelemetryRecord>,
}

/// In-memory store used by the demo binary and the test suite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_owned_card(&self, card: OwnedCard) -> ArenaResult<()> {
        card.validate()?;
        self.inner
            .write()
            .await
            .owned_cards
            .insert(card.id.clone(), card);
        Ok(())
    }

    async fn find_owned_card(&self, id: &str) -> ArenaResult<Option<OwnedCard>> {
        Ok(self.inner.read().await.owned_cards.get(id).cloned())
    }

    async fn owned_cards_for_player(
        &self,
        guild_id: &str,
        owner_id: &str,
    ) -> ArenaResult<Vec<OwnedCard>> {
        Ok(self
            .inner
            .read()
            .await
            .owned_cards
            .values()
            .filter(|c| c.guild_id == guild_id && c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn insert_owned_move(&self, owned_move: OwnedMove) -> ArenaResult<()> {
        owned_move.validate()?;
        self.inner
            .write()
            .await
            .owned_moves
            .insert(owned_move.id.clone(), owned_move);
        Ok(())
    }

    async fn moves_for_card(&self, owned_card_id: &str) -> ArenaResult<Vec<OwnedMove>> {
        Ok(self
            .inner
            .read()
            .await
            .owned_moves
            .values()
            .filter(|m| m.owned_card_id == owned_card_id)
            .cloned()
            .collect())
    }

    async fn insert_battle(&self, battle: Battle) -> ArenaResult<()> {
        battle.validate()?;
        self.inner
            .write()
            .await
            .battles
            .insert(battle.id.clone(), battle);
        Ok(())
    }

    async fn find_battle(&self, id: &str) -> ArenaResult<Option<Battle>> {
        Ok(self.inner.read().await.battles.get(id).cloned())
    }

    async fn update_battle(&self, battle: Battle) -> ArenaResult<()> {
        battle.validate()?;
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.battles.get(&battle.id) {
            let status_changed = existing.status != battle.status;
            if status_changed && !existing.status.can_transition_to(battle.status) {
                return Err(ConflictError::StaleTransition {
                    from: existing.status,
                }
                .into());
            }
        }
        inner.battles.insert(battle.id.clone(), battle);
        Ok(())
    }

    async fn find_pending_between(
        &self,
        guild_id: &str,
        challenger_id: &str,
        challenged_id: &str,
    ) -> ArenaResult<Option<Battle>> {
        Ok(self
            .inner
            .read()
            .await
            .battles
            .values()
            .find(|b| {
                b.guild_id == guild_id
                    && b.status == BattleStatus::Pending
                    && b.challenger_id == challenger_id
                    && b.challenged_id == challenged_id
            })
            .cloned())
    }

    async fn find_engagement(
        &self,
        guild_id: &str,
        player_id: &str,
    ) -> ArenaResult<Option<Battle>> {
        Ok(self
            .inner
            .read()
            .await
            .battles
            .values()
            .find(|b| {
                b.guild_id == guild_id && !b.status.is_terminal() && b.is_participant(player_id)
            })
            .cloned())
    }

    async fn insert_turn(&self, turn: TurnRecord) -> ArenaResult<()> {
        turn.validate()?;
        self.inner.write().await.turns.push(turn);
        Ok(())
    }

    async fn turns_for_battle(&self, battle_id: &str) -> ArenaResult<Vec<TurnRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .turns
            .iter()
            .filter(|t| t.battle_id == battle_id)
            .cloned()
            .collect())
    }

    async fn upsert_telemetry(&self, telemetry: TelemetryRecord) -> ArenaResult<()> {
        telemetry.validate()?;
        self.inner.write().await.telemetry.insert(
            (telemetry.battle_id.clone(), telemetry.player_id.clone()),
            telemetry,
        );
        Ok(())
    }

    async fn find_telemetry(
        &self,
        battle_id: &str,
        player_id: &str,
    ) -> ArenaResult<Option<TelemetryRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .telemetry
            .get(&(battle_id.to_string(), player_id.to_string()))
            .cloned())
    }
}
