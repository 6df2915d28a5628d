//! Provably fair games
//!
//! Commit-reveal seed sessions and the deterministic mapping from
//! `(server seed, client seed, nonce)` to a coin flip or dice roll.

pub mod engine;
pub mod hasher;
pub mod outcome;
pub mod registry;
pub mod seed;
pub mod session;
pub mod types;
pub mod verify;

pub use engine::GameEngine;
pub use outcome::{CoinOutcome, DiceOutcome, Multiplier, OutcomeDeriver};
pub use registry::{SessionKey, SessionRegistry, SessionStarted, SessionStatus, SettledPlay};
pub use seed::{EntropySource, OsEntropy, SeedGenerator};
pub use session::SessionState;
pub use types::*;
pub use verify::{audit_session, verify_commitment, AuditReport};
