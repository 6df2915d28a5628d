//! Error types for the Fairflip game service
//!
//! Every failure a caller can observe is a typed variant; nothing is reported
//! as a bare string.

use crate::games::types::GameType;
use thiserror::Error;

/// Root error type for all Fairflip operations
#[derive(Debug, Error)]
pub enum FairflipError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the commit-reveal game core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Operation requires an active session but none exists
    #[error("No active session. Start a session before playing")]
    NoActiveSession,

    /// A session is already running for this caller; it must be ended first
    #[error("A session is already active. End it to reveal its seeds before starting a new one")]
    SessionAlreadyActive,

    /// Player input lies outside the game's accepted domain
    #[error("Invalid choice for {game}: {reason}")]
    InvalidChoice { game: GameType, reason: String },

    /// Caller identity is missing or unusable as a session key
    #[error("Invalid player id: {0}")]
    InvalidPlayer(String),

    /// The secure random source could not produce seed material
    #[error("Entropy source failure: {0}")]
    EntropySourceFailure(String),

    /// The registry refuses to open more concurrent sessions
    #[error("Session limit reached ({limit} active sessions)")]
    SessionLimitReached { limit: usize },

    /// A commit hash could not be turned into an outcome
    #[error("Malformed digest: {0}")]
    MalformedDigest(String),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Missing required field: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl GameError {
    pub fn invalid_choice(game: GameType, reason: impl Into<String>) -> Self {
        GameError::InvalidChoice {
            game,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used by the HTTP layer
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NoActiveSession => "NO_ACTIVE_SESSION",
            GameError::SessionAlreadyActive => "SESSION_ALREADY_ACTIVE",
            GameError::InvalidChoice { .. } => "INVALID_CHOICE",
            GameError::InvalidPlayer(_) => "INVALID_PLAYER",
            GameError::EntropySourceFailure(_) => "ENTROPY_SOURCE_FAILURE",
            GameError::SessionLimitReached { .. } => "SESSION_LIMIT_REACHED",
            GameError::MalformedDigest(_) => "MALFORMED_DIGEST",
        }
    }
}

/// Convenience type alias for Results
pub type FairflipResult<T> = Result<T, FairflipError>;

/// Result alias for the game core
pub type GameResult<T> = Result<T, GameError>;
