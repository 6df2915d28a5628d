//! Commit-reveal session state machine
//!
//! `Absent -> Active -> Absent`. While active the session owns the secret
//! server seed and the nonce counter; the seed only leaves through `end`.

use crate::errors::{GameError, GameResult};
use crate::games::hasher;
use crate::games::seed::SeedGenerator;
use crate::games::types::{SessionCommitment, SessionReveal};

/// Seed material of one session
#[derive(Clone, PartialEq, Eq)]
struct SeedPair {
    server_seed: String,
    client_seed: String,
    commitment: String,
}

impl SeedPair {
    fn new(server_seed: String, client_seed: String) -> Self {
        let commitment = hasher::commitment(&server_seed);
        Self {
            server_seed,
            client_seed,
            commitment,
        }
    }
}

#[derive(Clone)]
enum Phase {
    Absent,
    Active { seeds: SeedPair, nonce: u64 },
}

/// Inputs of the play about to be settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPlay {
    pub nonce: u64,
    pub combined_input: String,
    pub commit_hash: String,
}

/// One caller's session
#[derive(Clone)]
pub struct SessionState {
    phase: Phase,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Absent,
        }
    }

    /// Active session over known seeds, nonce 0.
    ///
    /// Meant for replaying revealed sessions and for callers that supply their
    /// own client seed; live sessions should use [`SessionState::start`].
    pub fn from_seeds(server_seed: impl Into<String>, client_seed: impl Into<String>) -> Self {
        Self {
            phase: Phase::Active {
                seeds: SeedPair::new(server_seed.into(), client_seed.into()),
                nonce: 0,
            },
        }
    }

    /// Open a session with fresh seeds and publish the commitment.
    ///
    /// Fails with `SessionAlreadyActive` instead of discarding the running
    /// session, whose seeds would otherwise never be revealed.
    pub fn start(&mut self, generator: &SeedGenerator) -> GameResult<SessionCommitment> {
        if self.is_active() {
            return Err(GameError::SessionAlreadyActive);
        }

        let server_seed = generator.generate()?;
        let client_seed = generator.generate()?;
        let seeds = SeedPair::new(server_seed, client_seed);

        let published = SessionCommitment {
            commitment: seeds.commitment.clone(),
            client_seed: seeds.client_seed.clone(),
        };

        tracing::info!(
            commitment = %published.commitment,
            client_seed = %published.client_seed,
            "Session started"
        );

        self.phase = Phase::Active { seeds, nonce: 0 };
        Ok(published)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    /// Nonce of the last settled play (0 before the first)
    pub fn nonce(&self) -> Option<u64> {
        match &self.phase {
            Phase::Active { nonce, .. } => Some(*nonce),
            Phase::Absent => None,
        }
    }

    pub fn commitment(&self) -> Option<&str> {
        match &self.phase {
            Phase::Active { seeds, .. } => Some(&seeds.commitment),
            Phase::Absent => None,
        }
    }

    pub fn client_seed(&self) -> Option<&str> {
        match &self.phase {
            Phase::Active { seeds, .. } => Some(&seeds.client_seed),
            Phase::Absent => None,
        }
    }

    /// Fails with `NoActiveSession` unless a session is running
    pub fn ensure_active(&self) -> GameResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(GameError::NoActiveSession)
        }
    }

    /// Settle one play at `nonce + 1`.
    ///
    /// `settle` receives the hash inputs for the next nonce. The counter only
    /// advances when it returns `Ok`, so a rejected play never burns a nonce.
    pub fn play_with<T, F>(&mut self, settle: F) -> GameResult<T>
    where
        F: FnOnce(&PendingPlay) -> GameResult<T>,
    {
        let Phase::Active { seeds, nonce } = &mut self.phase else {
            return Err(GameError::NoActiveSession);
        };

        let next = *nonce + 1;
        let combined_input = hasher::play_input(&seeds.server_seed, &seeds.client_seed, next);
        let commit_hash = hasher::sha256_hex(combined_input.as_bytes());
        let pending = PendingPlay {
            nonce: next,
            combined_input,
            commit_hash,
        };

        let settled = settle(&pending)?;
        *nonce = next;
        Ok(settled)
    }

    /// Close the session and reveal its seeds with the final nonce
    pub fn end(&mut self) -> GameResult<SessionReveal> {
        match std::mem::replace(&mut self.phase, Phase::Absent) {
            Phase::Active { seeds, nonce } => {
                tracing::info!(
                    server_seed = %seeds.server_seed,
                    client_seed = %seeds.client_seed,
                    final_nonce = nonce,
                    "Session ended, seeds revealed"
                );
                Ok(SessionReveal {
                    server_seed: seeds.server_seed,
                    client_seed: seeds.client_seed,
                    commitment: seeds.commitment,
                    final_nonce: nonce,
                })
            }
            Phase::Absent => Err(GameError::NoActiveSession),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The server seed stays out of debug output.
        match &self.phase {
            Phase::Absent => f.write_str("SessionState::Absent"),
            Phase::Active { seeds, nonce } => f
                .debug_struct("SessionState::Active")
                .field("commitment", &seeds.commitment)
                .field("client_seed", &seeds.client_seed)
                .field("nonce", nonce)
                .finish_non_exhaustive(),
        }
    }
}
