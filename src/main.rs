use card_arena::{
    claim_card, ArenaResult, Battle, BattleConfig, BattleService, Catalog, MemoryStore, Notifier,
    SpawnScheduler, Store, TurnAction,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Notifier that prints battle traffic to stdout, standing in for the chat
/// front end.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn challenge_created(&self, battle: &Battle) {
        println!(
            "{} challenged {} to a battle!",
            battle.challenger_id, battle.challenged_id
        );
    }

    fn challenge_resolved(&self, battle: &Battle, accepted: bool) {
        if accepted {
            println!("{} accepted the challenge!", battle.challenged_id);
        } else {
            println!("The challenge was turned down ({}).", battle.status);
        }
    }

    fn turn_resolved(&self, _battle: &Battle, lines: &[String]) {
        for line in lines {
            println!("{}", line);
        }
    }

    fn battle_ended(&self, _battle: &Battle, outcome: &str) {
        println!("{}", outcome);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        eprintln!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> ArenaResult<()> {
    let catalog = Arc::new(Catalog::load(Path::new("data"))?);
    println!("Loaded catalog with {} cards", catalog.card_count());

    let store = Arc::new(MemoryStore::new());
    let guild = "demo-guild";

    // Each player claims one of every catalog card; power, rank and move
    // set are rolled at claim time and frozen.
    for player in ["alice", "bob"] {
        for name in catalog.card_names().map(String::from).collect::<Vec<_>>() {
            let card = claim_card(store.as_ref(), &catalog, &name, guild, player, false).await?;
            println!(
                "  {} claimed {} (rank {}, power {})",
                player, card.name, card.rank, card.real_power
            );
        }
    }

    let service = BattleService::new(
        Arc::clone(&store),
        Arc::clone(&catalog),
        Arc::new(ConsoleNotifier),
        BattleConfig::default(),
    );

    let battle = service.create_challenge(guild, "alice", "bob").await?;
    service.respond(&battle.id, "bob", true).await?;

    for player in ["alice", "bob"] {
        let picks: Vec<String> = store
            .owned_cards_for_player(guild, player)
            .await?
            .into_iter()
            .take(4)
            .map(|c| c.id)
            .collect();
        service.select_cards(&battle.id, player, &picks).await?;
    }

    // Alternate move submissions, cycling the loadout slots, until a side
    // runs out of cards.
    for turn in 0..200u32 {
        let Some(current) = store
            .find_battle(&battle.id)
            .await?
            .and_then(|b| b.current_turn_player_id)
        else {
            break;
        };
        let action = TurnAction::UseMove {
            move_index: (turn % 3) as usize,
        };
        service.submit_move(&battle.id, &current, action, 500).await?;
    }

    for player in ["alice", "bob"] {
        if let Some(telemetry) = store.find_telemetry(&battle.id, player).await? {
            println!(
                "{}: {} turns, {} damage dealt, {} healing done",
                player,
                telemetry.total_turns,
                telemetry.total_damage_dealt,
                telemetry.total_healing_done
            );
        }
    }

    // Spawn scheduling: one ticking task per guild, replaced on reschedule.
    let (scheduler, mut spawns) = SpawnScheduler::new(16);
    scheduler.schedule_guild(guild, Duration::from_secs(2));
    if let Some(request) = spawns.recv().await {
        println!("Spawn tick for {}", request.guild_id);
    }
    scheduler.cancel_guild(guild);

    Ok(())
}
