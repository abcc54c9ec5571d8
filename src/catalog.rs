//! Immutable card catalog: base-card definitions, category combat profiles
//! and named move pools.
//!
//! Content is authored as RON files and loaded once at startup. Gameplay code
//! only ever reads; authoring is an external administrative concern.

use crate::errors::{ArenaResult, ValidationError};
use schema::{CatalogCard, CategoryProfile, MoveData, Validate};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Name of the shared fallback move pool.
pub const BASIC_POOL: &str = "Basic";

#[derive(Debug, Clone)]
pub struct Catalog {
    cards: HashMap<String, CatalogCard>,
    categories: HashMap<String, CategoryProfile>,
    /// Move pools keyed by card name, category name, or `BASIC_POOL`.
    pools: HashMap<String, Vec<MoveData>>,
}

impl Catalog {
    /// Load the catalog from a content directory holding `cards.ron`,
    /// `categories.ron` and `moves.ron`.
    pub fn load(data_path: &Path) -> ArenaResult<Catalog> {
        let cards: Vec<CatalogCard> = read_ron(&data_path.join("cards.ron"))?;
        let categories: Vec<CategoryProfile> = read_ron(&data_path.join("categories.ron"))?;
        let pools: HashMap<String, Vec<MoveData>> = read_ron(&data_path.join("moves.ron"))?;
        Catalog::from_parts(cards, categories, pools)
    }

    /// Assemble a catalog from already-built content. Every entity is run
    /// through its declarative schema before it is accepted.
    pub fn from_parts(
        cards: Vec<CatalogCard>,
        categories: Vec<CategoryProfile>,
        pools: HashMap<String, Vec<MoveData>>,
    ) -> ArenaResult<Catalog> {
        for card in &cards {
            card.validate()
                .map_err(|v| ValidationError::MalformedContent(v.to_string()))?;
        }
        for category in &categories {
            category
                .validate()
                .map_err(|v| ValidationError::MalformedContent(v.to_string()))?;
        }
        for pool in pools.values() {
            for move_data in pool {
                move_data
                    .validate()
                    .map_err(|v| ValidationError::MalformedContent(v.to_string()))?;
            }
        }

        Ok(Catalog {
            cards: cards.into_iter().map(|c| (c.name.clone(), c)).collect(),
            categories: categories
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
            pools,
        })
    }

    /// Pure lookup by card name.
    pub fn card_by_name(&self, name: &str) -> ArenaResult<&CatalogCard> {
        self.cards
            .get(name)
            .ok_or_else(|| ValidationError::UnknownCard(name.to_string()).into())
    }

    pub fn category(&self, name: &str) -> Option<&CategoryProfile> {
        self.categories.get(name)
    }

    /// The move pool tied to a card or category name, if one is configured.
    pub fn move_pool(&self, name: &str) -> Option<&[MoveData]> {
        self.pools.get(name).map(|p| p.as_slice())
    }

    pub fn card_names(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(|k| k.as_str())
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

fn read_ron<T: serde::de::DeserializeOwned>(path: &Path) -> ArenaResult<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        ValidationError::MalformedContent(format!("{}: {}", path.display(), e))
    })?;
    ron::from_str(&content).map_err(|e| {
        ValidationError::MalformedContent(format!("{}: {}", path.display(), e)).into()
    })
}
