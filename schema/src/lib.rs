// Card Arena Schema - Shared type definitions
// This crate contains the entity types shared between the engine, the
// persistence layer, and the content files, plus the declarative validators
// the store applies at write time.

// Re-export the main types
pub use battle::*;
pub use cards::*;
pub use moves::*;
pub use validate::*;

pub mod battle;
pub mod cards;
pub mod moves;
pub mod validate;
