//! Card instantiation engine: turns a catalog template into a player-owned
//! card with a rolled power, a weighted rarity tier and a resolved 3-move
//! loadout.
//!
//! Power and move set are rolled exactly once, at claim time. An owned card
//! is never re-rolled; a different move set requires a new instance.

use crate::catalog::{Catalog, BASIC_POOL};
use crate::errors::{ArenaResult, ResourceError};
use crate::rng::weighted_index;
use crate::store::Store;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use schema::{CatalogCard, MoveData, OwnedCard, OwnedMove, Rank};
use uuid::Uuid;

/// Roll the instance power for a catalog template.
///
/// Templates configured at rank 4 and above draw a tight factor around the
/// base power. Lower ranks draw their factor from a sub-range whose bounds
/// are themselves rolled, which spreads the results much wider. The result
/// is floored, clamped to 1000 and snapped to the nearest multiple of 50.
pub fn roll_real_power<R: Rng + ?Sized>(rng: &mut R, card: &CatalogCard) -> u32 {
    let factor = if card.rank >= 4 {
        rng.random_range(0.9..1.111)
    } else {
        let low = rng.random_range(0.5..0.899);
        let high = rng.random_range(1.1..1.4599);
        rng.random_range(low..high)
    };

    let rolled = (card.base_power as f64 * factor).floor() as i64;
    let clamped = rolled.max(1000);
    (((clamped + 25) / 50) * 50) as u32
}

/// Weighted pick over the template's rarity table, mapped to a tier label.
/// The table is 1-based: index 1 is the heaviest, most common tier.
pub fn choose_rank<R: Rng + ?Sized>(rng: &mut R, rarity_weights: &[f64]) -> ArenaResult<Rank> {
    let index = weighted_index(rng, rarity_weights.iter().copied())?;
    Ok(Rank::from_tier(index + 1))
}

/// Resolve the 3-move loadout for a template: one move tied to the card
/// itself and one for each of two category draws.
///
/// Fallback policy (the upstream behavior is ambiguous here, see DESIGN.md):
/// each lookup tries the configured pool first and the `"Basic"` pool second,
/// exactly once each. If the deduplicated candidate set is still empty the
/// resolution fails with `MoveResolution` rather than looping.
pub fn resolve_move_set<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &Catalog,
    card: &CatalogCard,
) -> ArenaResult<Vec<MoveData>> {
    let mut selected: Vec<MoveData> = Vec::with_capacity(3);

    let tied = pick_from_pools(rng, catalog, &card.name, &selected)?;
    selected.push(tied);

    let mut categories = card.categories.clone();
    categories.shuffle(rng);
    let first = categories.first().ok_or_else(|| {
        ResourceError::MoveResolution(format!("card {} has no categories", card.name))
    })?;
    // A single-category card draws from the same category twice.
    let second = categories.get(1).unwrap_or(first);

    for category in [first.as_str(), second.as_str()] {
        let pick = pick_from_pools(rng, catalog, category, &selected)?;
        selected.push(pick);
    }

    Ok(selected)
}

/// Draw up to 3 candidates from the named pool (then the Basic pool), filter
/// out already-selected move ids, and pick one uniformly from the rest.
fn pick_from_pools<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &Catalog,
    pool_name: &str,
    selected: &[MoveData],
) -> ArenaResult<MoveData> {
    for name in [pool_name, BASIC_POOL] {
        let Some(pool) = catalog.move_pool(name) else {
            continue;
        };
        let candidates: Vec<&MoveData> = pool
            .choose_multiple(rng, 3)
            .filter(|candidate| !selected.iter().any(|s| s.id == candidate.id))
            .collect();
        if let Some(pick) = candidates.choose(rng) {
            return Ok((*pick).clone());
        }
    }

    Err(ResourceError::MoveResolution(format!(
        "no distinct candidates left for pool {}",
        pool_name
    ))
    .into())
}

/// Instantiate a catalog card into an owned card plus its cloned moves.
/// The moves get fresh identities, point back at the new card and start at
/// level 1.
pub fn instantiate<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &Catalog,
    card_name: &str,
    guild_id: &str,
    owner_id: &str,
    in_group: bool,
) -> ArenaResult<(OwnedCard, Vec<OwnedMove>)> {
    let template = catalog.card_by_name(card_name)?;
    let rank = choose_rank(rng, &template.rarity_weights)?;
    let real_power = roll_real_power(rng, template);
    let move_set = resolve_move_set(rng, catalog, template)?;

    let card_id = Uuid::new_v4().to_string();
    let owned_moves: Vec<OwnedMove> = move_set
        .into_iter()
        .map(|data| OwnedMove {
            id: Uuid::new_v4().to_string(),
            move_id: data.id.clone(),
            owned_card_id: card_id.clone(),
            level: 1,
            data,
        })
        .collect();

    let owned = OwnedCard {
        id: card_id,
        catalog_card_id: template.id.clone(),
        name: template.name.clone(),
        real_power,
        rank,
        move_ids: owned_moves.iter().map(|m| m.id.clone()).collect(),
        in_group,
        owner_id: owner_id.to_string(),
        guild_id: guild_id.to_string(),
    };

    Ok((owned, owned_moves))
}

/// Claim a card for a player: instantiate it and persist the card and its
/// moves. This is the one write boundary for owned cards; nothing mutates
/// them afterwards.
pub async fn claim_card<S: Store + ?Sized>(
    store: &S,
    catalog: &Catalog,
    card_name: &str,
    guild_id: &str,
    owner_id: &str,
    in_group: bool,
) -> ArenaResult<OwnedCard> {
    let (card, moves) = {
        let mut rng = rand::rng();
        instantiate(&mut rng, catalog, card_name, guild_id, owner_id, in_group)?
    };

    for owned_move in moves {
        store.insert_owned_move(owned_move).await?;
    }
    store.insert_owned_card(card.clone()).await?;
    tracing::debug!(card = %card.name, owner = %card.owner_id, power = card.real_power, "card claimed");

    Ok(card)
}
