use crate::battle::service::{BattleConfig, BattleService, Notifier};
use crate::catalog::{Catalog, BASIC_POOL};
use crate::errors::ArenaResult;
use crate::store::{MemoryStore, Store};
use async_trait::async_trait;
use schema::{
    Battle, CatalogCard, CategoryProfile, MoveData, MoveKind, OwnedCard, OwnedMove, Rank,
    TelemetryRecord, TurnRecord,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;
use uuid::Uuid;

pub const GUILD: &str = "guild-1";

/// Catalog used by the service tests: two templates with deterministic
/// combat math (no crits, neutral category damage, Water strong into Fire).
pub fn test_catalog() -> Catalog {
    let cards = vec![
        CatalogCard {
            id: "catalog-tidal-drake".to_string(),
            name: "Tidal Drake".to_string(),
            base_power: 4800,
            categories: vec!["Water".to_string()],
            rank: 2,
            rarity_weights: vec![60.0, 20.0, 10.0],
        },
        CatalogCard {
            id: "catalog-ember-fox".to_string(),
            name: "Ember Fox".to_string(),
            base_power: 2900,
            categories: vec!["Fire".to_string()],
            rank: 1,
            rarity_weights: vec![60.0, 20.0, 10.0],
        },
    ];
    let categories = vec![
        CategoryProfile {
            name: "Water".to_string(),
            resistance: vec![],
            weakness: vec!["Fire".to_string()],
            strength: "Fire".to_string(),
            crit_chance: 0,
            crit_damage: 1.0,
            dmg: 1.0,
        },
        CategoryProfile {
            name: "Fire".to_string(),
            resistance: vec![],
            weakness: vec![],
            strength: String::new(),
            crit_chance: 0,
            crit_damage: 1.0,
            dmg: 1.0,
        },
    ];
    let pools = HashMap::from([(
        BASIC_POOL.to_string(),
        vec![jab(), attack("shove", "", 150), attack("headbutt", "", 250)],
    )]);
    match Catalog::from_parts(cards, categories, pools) {
        Ok(catalog) => catalog,
        Err(err) => panic!("test catalog must validate: {}", err),
    }
}

pub fn attack(id: &str, category: &str, base_damage: u32) -> MoveData {
    MoveData {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        kind: MoveKind::Attack,
        category: category.to_string(),
        base_damage,
        special_damage: 0,
        own_modifier: 1.0,
        other_modifier: 1.0,
        duration: 0,
        modifiers: vec![],
        requirement_form: None,
    }
}

pub fn jab() -> MoveData {
    attack("jab", "", 200)
}

pub fn geyser() -> MoveData {
    attack("geyser", "Water", 500)
}

/// One-shots any 1000-power card; keeps end-to-end battles short.
pub fn maelstrom() -> MoveData {
    attack("maelstrom", "Water", 5000)
}

pub fn mend() -> MoveData {
    MoveData {
        kind: MoveKind::Heal,
        special_damage: 600,
        ..attack("mend", "Water", 0)
    }
}

/// Notifier that records what the front end would have been told.
#[derive(Default)]
pub struct RecordingNotifier {
    pub turn_lines: Mutex<Vec<String>>,
    pub endings: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn turn_resolved(&self, _battle: &Battle, lines: &[String]) {
        if let Ok(mut turn_lines) = self.turn_lines.lock() {
            turn_lines.extend_from_slice(lines);
        }
    }

    fn battle_ended(&self, _battle: &Battle, outcome: &str) {
        if let Ok(mut endings) = self.endings.lock() {
            endings.push(outcome.to_string());
        }
    }
}

impl RecordingNotifier {
    pub fn ending_count(&self) -> usize {
        self.endings.lock().map(|e| e.len()).unwrap_or(0)
    }
}

pub fn service_with_defaults() -> (
    Arc<MemoryStore>,
    Arc<BattleService<MemoryStore>>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = BattleService::new(
        Arc::clone(&store),
        Arc::new(test_catalog()),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        BattleConfig::default(),
    );
    (store, service, notifier)
}

/// Insert an owned card with the given move set and return its id. Owned
/// cards carry exactly 3 moves; short lists are padded with weak fillers so
/// tests only spell out the moves they exercise.
pub async fn give_card(
    store: &MemoryStore,
    owner: &str,
    name: &str,
    power: u32,
    mut moves: Vec<MoveData>,
) -> String {
    while moves.len() < 3 {
        moves.push(attack(&format!("filler-{}", moves.len()), "", 100));
    }
    let card_id = Uuid::new_v4().to_string();
    let mut move_ids = Vec::new();
    for data in moves {
        let owned_move = OwnedMove {
            id: Uuid::new_v4().to_string(),
            move_id: data.id.clone(),
            owned_card_id: card_id.clone(),
            level: 1,
            data,
        };
        move_ids.push(owned_move.id.clone());
        if let Err(err) = store.insert_owned_move(owned_move).await {
            panic!("seeding a move must succeed: {}", err);
        }
    }
    let card = OwnedCard {
        id: card_id.clone(),
        catalog_card_id: format!("catalog-{}", name),
        name: name.to_string(),
        real_power: power,
        rank: Rank::C,
        move_ids,
        in_group: true,
        owner_id: owner.to_string(),
        guild_id: GUILD.to_string(),
    };
    if let Err(err) = store.insert_owned_card(card).await {
        panic!("seeding a card must succeed: {}", err);
    }
    card_id
}

/// Give a player 4 identical cards and return the ids in creation order.
/// The first id becomes the active card once selected.
pub async fn seed_loadout(
    store: &MemoryStore,
    owner: &str,
    name: &str,
    power: u32,
    moves: Vec<MoveData>,
) -> Vec<String> {
    let mut ids = Vec::with_capacity(4);
    for _ in 0..4 {
        ids.push(give_card(store, owner, name, power, moves.clone()).await);
    }
    ids
}

/// Drive a challenge all the way to the first turn: alice challenges bob,
/// bob accepts, both lock in the given loadouts.
pub async fn start_battle(
    service: &Arc<BattleService<MemoryStore>>,
    alice_cards: &[String],
    bob_cards: &[String],
) -> Battle {
    let battle = match service.create_challenge(GUILD, "alice", "bob").await {
        Ok(battle) => battle,
        Err(err) => panic!("challenge must succeed: {}", err),
    };
    service.respond(&battle.id, "bob", true).await.unwrap();
    service
        .select_cards(&battle.id, "alice", alice_cards)
        .await
        .unwrap();
    service
        .select_cards(&battle.id, "bob", bob_cards)
        .await
        .unwrap();
    battle
}

/// Let spawned timer tasks run to completion under a paused clock.
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

/// Store wrapper modelling a remote document store: every lookup yields to
/// the runtime before answering, so concurrent callers interleave the way
/// they would against real storage. Turn writes can additionally be made to
/// wait until a given number of them are in flight at once.
pub struct LaggyStore {
    inner: MemoryStore,
    turn_rendezvous: Option<Barrier>,
}

impl LaggyStore {
    pub fn new() -> Self {
        LaggyStore {
            inner: MemoryStore::new(),
            turn_rendezvous: None,
        }
    }

    /// Turn writes block until `parties` of them have arrived.
    pub fn with_turn_rendezvous(parties: usize) -> Self {
        LaggyStore {
            inner: MemoryStore::new(),
            turn_rendezvous: Some(Barrier::new(parties)),
        }
    }

    /// Direct access for seeding, bypassing the artificial latency.
    pub fn seedable(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl Store for LaggyStore {
    async fn insert_owned_card(&self, card: OwnedCard) -> ArenaResult<()> {
        self.inner.insert_owned_card(card).await
    }

    async fn find_owned_card(&self, id: &str) -> ArenaResult<Option<OwnedCard>> {
        tokio::task::yield_now().await;
        self.inner.find_owned_card(id).await
    }

    async fn owned_cards_for_player(
        &self,
        guild_id: &str,
        owner_id: &str,
    ) -> ArenaResult<Vec<OwnedCard>> {
        tokio::task::yield_now().await;
        self.inner.owned_cards_for_player(guild_id, owner_id).await
    }

    async fn insert_owned_move(&self, owned_move: OwnedMove) -> ArenaResult<()> {
        self.inner.insert_owned_move(owned_move).await
    }

    async fn moves_for_card(&self, owned_card_id: &str) -> ArenaResult<Vec<OwnedMove>> {
        tokio::task::yield_now().await;
        self.inner.moves_for_card(owned_card_id).await
    }

    async fn insert_battle(&self, battle: Battle) -> ArenaResult<()> {
        self.inner.insert_battle(battle).await
    }

    async fn find_battle(&self, id: &str) -> ArenaResult<Option<Battle>> {
        tokio::task::yield_now().await;
        self.inner.find_battle(id).await
    }

    async fn update_battle(&self, battle: Battle) -> ArenaResult<()> {
        self.inner.update_battle(battle).await
    }

    async fn find_pending_between(
        &self,
        guild_id: &str,
        challenger_id: &str,
        challenged_id: &str,
    ) -> ArenaResult<Option<Battle>> {
        tokio::task::yield_now().await;
        self.inner
            .find_pending_between(guild_id, challenger_id, challenged_id)
            .await
    }

    async fn find_engagement(
        &self,
        guild_id: &str,
        player_id: &str,
    ) -> ArenaResult<Option<Battle>> {
        tokio::task::yield_now().await;
        self.inner.find_engagement(guild_id, player_id).await
    }

    async fn insert_turn(&self, turn: TurnRecord) -> ArenaResult<()> {
        if let Some(barrier) = &self.turn_rendezvous {
            barrier.wait().await;
        }
        self.inner.insert_turn(turn).await
    }

    async fn turns_for_battle(&self, battle_id: &str) -> ArenaResult<Vec<TurnRecord>> {
        tokio::task::yield_now().await;
        self.inner.turns_for_battle(battle_id).await
    }

    async fn upsert_telemetry(&self, telemetry: TelemetryRecord) -> ArenaResult<()> {
        self.inner.upsert_telemetry(telemetry).await
    }

    async fn find_telemetry(
        &self,
        battle_id: &str,
        player_id: &str,
    ) -> ArenaResult<Option<TelemetryRecord>> {
        tokio::task::yield_now().await;
        self.inner.find_telemetry(battle_id, player_id).await
    }
}
