use schema::{BattleStatus, SchemaViolation};
use std::fmt;

/// Main error type for the Card Arena engine
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaError {
    /// Malformed input; rejected immediately with no state change
    Validation(ValidationError),
    /// Valid input that lost a race or arrived in the wrong state
    Conflict(ConflictError),
    /// A required resource (cards, move candidates) could not be gathered
    Resource(ResourceError),
    /// A bounded wait elapsed and the default transition already happened
    Timeout(TimeoutError),
    /// The document store failed; retryable, nothing was committed
    Persistence(PersistenceError),
}

/// Errors for malformed or unresolvable input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A player tried to challenge themselves
    SelfChallenge,
    /// Weighted sampling over an all-zero or negative weight table
    InvalidDistribution,
    /// The named action targets something that does not exist or is out of play
    InvalidTarget(String),
    /// No catalog card with this name
    UnknownCard(String),
    /// No battle with this id
    UnknownBattle(String),
    /// A content file failed to parse or validate
    MalformedContent(String),
}

/// Errors for operations that raced or arrived in the wrong battle state
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictError {
    /// A pending challenge between the same ordered pair already exists
    DuplicatePending {
        challenger: String,
        challenged: String,
    },
    /// The player already has a non-terminal battle in this guild
    AlreadyEngaged { player_id: String },
    /// The player has no ongoing battle in this guild
    NotInBattle { player_id: String },
    /// A move was submitted by the player whose turn it is not
    NotYourTurn { player_id: String },
    /// The player already locked in a card selection for this battle
    CardsAlreadySelected { player_id: String },
    /// A turn was submitted before both sides finished selecting cards
    SelectionIncomplete,
    /// The battle is not in a state that accepts this transition
    StaleTransition { from: BattleStatus },
}

/// Errors for exhausted gameplay resources
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The player cannot field the required loadout
    InsufficientCards { required: usize, actual: usize },
    /// Move resolution ran out of distinct candidates after fallback
    MoveResolution(String),
}

/// Errors reported to callers who acted after a bounded wait elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutError {
    /// The challenge response window passed; the battle expired
    ResponseWindowElapsed,
    /// The move submission window passed; the turn auto-advanced
    TurnWindowElapsed,
}

/// Errors from the persistence collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The store could not serve the request; safe to retry
    Unavailable(String),
    /// The entity failed its declarative schema at the write boundary
    SchemaViolation(SchemaViolation),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::Validation(err) => write!(f, "Validation error: {}", err),
            ArenaError::Conflict(err) => write!(f, "Conflict error: {}", err),
            ArenaError::Resource(err) => write!(f, "Resource error: {}", err),
            ArenaError::Timeout(err) => write!(f, "Timeout error: {}", err),
            ArenaError::Persistence(err) => write!(f, "Persistence error: {}", err),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SelfChallenge => write!(f, "Players cannot challenge themselves"),
            ValidationError::InvalidDistribution => {
                write!(f, "Weighted pick requires at least one positive weight")
            }
            ValidationError::InvalidTarget(details) => write!(f, "Invalid target: {}", details),
            ValidationError::UnknownCard(name) => write!(f, "Card not found: {}", name),
            ValidationError::UnknownBattle(id) => write!(f, "Battle not found: {}", id),
            ValidationError::MalformedContent(details) => {
                write!(f, "Malformed content: {}", details)
            }
        }
    }
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictError::DuplicatePending {
                challenger,
                challenged,
            } => write!(
                f,
                "A challenge from {} to {} is already pending",
                challenger, challenged
            ),
            ConflictError::AlreadyEngaged { player_id } => {
                write!(f, "{} already has an active battle", player_id)
            }
            ConflictError::NotInBattle { player_id } => {
                write!(f, "{} has no ongoing battle", player_id)
            }
            ConflictError::NotYourTurn { player_id } => {
                write!(f, "It is not {}'s turn", player_id)
            }
            ConflictError::CardsAlreadySelected { player_id } => {
                write!(f, "{} already selected their cards", player_id)
            }
            ConflictError::SelectionIncomplete => {
                write!(f, "Both players must select cards before the turn loop starts")
            }
            ConflictError::StaleTransition { from } => {
                write!(f, "Battle state {} does not accept this transition", from)
            }
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::InsufficientCards { required, actual } => write!(
                f,
                "At least {} owned cards are required, found {}",
                required, actual
            ),
            ResourceError::MoveResolution(details) => {
                write!(f, "Move resolution exhausted candidates: {}", details)
            }
        }
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutError::ResponseWindowElapsed => {
                write!(f, "The challenge response window elapsed")
            }
            TimeoutError::TurnWindowElapsed => write!(f, "The move submission window elapsed"),
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Unavailable(details) => write!(f, "Store unavailable: {}", details),
            PersistenceError::SchemaViolation(violation) => {
                write!(f, "Schema violation: {}", violation)
            }
        }
    }
}

impl std::error::Error for ArenaError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ConflictError {}
impl std::error::Error for ResourceError {}
impl std::error::Error for TimeoutError {}
impl std::error::Error for PersistenceError {}

impl From<ValidationError> for ArenaError {
    fn from(err: ValidationError) -> Self {
        ArenaError::Validation(err)
    }
}

impl From<ConflictError> for ArenaError {
    fn from(err: ConflictError) -> Self {
        ArenaError::Conflict(err)
    }
}

impl From<ResourceError> for ArenaError {
    fn from(err: ResourceError) -> Self {
        ArenaError::Resource(err)
    }
}

impl From<TimeoutError> for ArenaError {
    fn from(err: TimeoutError) -> Self {
        ArenaError::Timeout(err)
    }
}

impl From<PersistenceError> for ArenaError {
    fn from(err: PersistenceError) -> Self {
        ArenaError::Persistence(err)
    }
}

impl From<SchemaViolation> for ArenaError {
    fn from(violation: SchemaViolation) -> Self {
        ArenaError::Persistence(PersistenceError::SchemaViolation(violation))
    }
}

impl ArenaError {
    /// Whether the caller may retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArenaError::Persistence(PersistenceError::Unavailable(_))
        )
    }
}

/// Type alias for Results using ArenaError
pub type ArenaResult<T> = Result<T, ArenaError>;
