// In: src/lib.rs

//! Card Arena Battle Engine
//!
//! A collectible-card battle system: weighted card generation from a
//! content catalog, an async challenge/battle service with timeout
//! handling, and per-player battle telemetry. Designed to sit behind a
//! chat-platform front end, which this crate treats as a collaborator.

// --- MODULE DECLARATIONS ---
// This declares the module hierarchy for the crate.
pub mod battle;
pub mod cards;
pub mod catalog;
pub mod errors;
pub mod rng;
pub mod scheduler;
pub mod store;

// --- PUBLIC API RE-EXPORTS ---
// This section defines the public-facing API of the `card-arena` crate,
// making it easy for users to import the most important types directly.

// --- From the `schema` crate ---
// Re-export all core data definitions and static enums.
pub use schema::{
    Battle,
    BattleStatus,
    CatalogCard,
    CategoryProfile,
    FormCondition,
    Modifier,
    ModifierKind,
    ModifierStat,
    MoveData,
    MoveKind,
    MoveUsage,
    OwnedCard,
    OwnedMove,
    Rank,
    RequirementForm,
    SchemaViolation,
    TelemetryRecord,
    TurnRecord,
    Validate,
};

// --- From this crate's modules (`src/`) ---

// Core battle engine functions and state.
pub use battle::engine::{resolve_turn, TurnOutcome};
pub use battle::state::{
    ActiveCard, BattleEvent, CombatState, EventBus, PlayerTarget, SideState, TurnAction,
};

// The async battle lifecycle service and its collaborator seams.
pub use battle::service::{BattleConfig, BattleService, Notifier, NullNotifier};
pub use battle::telemetry::TelemetryAggregator;

// Card generation and content access.
pub use cards::{choose_rank, claim_card, instantiate, resolve_move_set, roll_real_power};
pub use catalog::{Catalog, BASIC_POOL};

// Persistence and scheduling.
pub use scheduler::{SpawnRequest, SpawnScheduler};
pub use store::{MemoryStore, Store};

// Crate-specific error and result types.
pub use errors::{
    ArenaError, ArenaResult, ConflictError, PersistenceError, ResourceError, TimeoutError,
    ValidationError,
};
