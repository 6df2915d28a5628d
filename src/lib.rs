//! Fairflip - Provably Fair Coin Flip and Dice
//!
//! A player opens a session and receives a SHA-256 commitment to a secret
//! server seed. Each play hashes `server-client-nonce` and derives the
//! outcome from the digest. Ending the session reveals the server seed so
//! every past play can be recomputed offline.

pub mod api;
pub mod config;
pub mod errors;
pub mod games;

pub use config::{ConfigLoader, FairflipConfig};
pub use errors::{FairflipError, FairflipResult, GameError, GameResult};
pub use games::{
    GameEngine, GameType, PlayRecord, PlayResult, RawChoice, SeedGenerator, SessionKey,
    SessionRegistry, SessionState,
};
