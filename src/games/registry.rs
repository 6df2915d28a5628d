//! Per-caller session arena
//!
//! Sessions are keyed by (player, game) so independent callers never share
//! seeds or nonces. Every operation on a key runs under that key's map shard
//! lock: a play reads, derives and advances the nonce as one critical section,
//! and an `end` waits for any in-flight play before revealing.

use crate::errors::{GameError, GameResult};
use crate::games::engine;
use crate::games::seed::SeedGenerator;
use crate::games::session::SessionState;
use crate::games::types::{GameType, PlayRecord, RawChoice, SessionReveal};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Longest accepted player id
pub const MAX_PLAYER_ID_LEN: usize = 128;

/// Identity a session is stored under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub player_id: String,
    pub game: GameType,
}

impl SessionKey {
    pub fn new(player_id: impl Into<String>, game: GameType) -> GameResult<Self> {
        let player_id = player_id.into();
        if player_id.trim().is_empty() {
            return Err(GameError::InvalidPlayer("player id must not be empty".to_string()));
        }
        if player_id.len() > MAX_PLAYER_ID_LEN {
            return Err(GameError::InvalidPlayer(format!(
                "player id longer than {} bytes",
                MAX_PLAYER_ID_LEN
            )));
        }
        if player_id.chars().any(char::is_control) {
            return Err(GameError::InvalidPlayer(
                "player id contains control characters".to_string(),
            ));
        }
        Ok(Self { player_id, game })
    }
}

/// A settled play with the client seed of the session that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledPlay {
    pub record: PlayRecord,
    pub client_seed: String,
}

/// Published data of a newly opened session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStarted {
    pub player_id: String,
    pub game: GameType,
    pub commitment: String,
    pub client_seed: String,
    pub started_at: DateTime<Utc>,
}

/// Public view of a running session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatus {
    pub player_id: String,
    pub game: GameType,
    pub commitment: String,
    pub client_seed: String,
    pub nonce: u64,
    pub started_at: DateTime<Utc>,
}

struct SessionSlot {
    state: SessionState,
    started_at: DateTime<Utc>,
}

/// Concurrent store of active sessions
pub struct SessionRegistry {
    sessions: DashMap<SessionKey, SessionSlot>,
    generator: SeedGenerator,
    max_active_sessions: usize,
    active: AtomicUsize,
}

impl SessionRegistry {
    pub fn new(generator: SeedGenerator, max_active_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            generator,
            max_active_sessions,
            active: AtomicUsize::new(0),
        }
    }

    /// Open a session for `key`; a second start before `end_session` is refused
    pub fn start_session(&self, key: &SessionKey) -> GameResult<SessionStarted> {
        let vacant = match self.sessions.entry(key.clone()) {
            Entry::Occupied(_) => return Err(GameError::SessionAlreadyActive),
            Entry::Vacant(vacant) => vacant,
        };

        if self.active.fetch_add(1, Ordering::SeqCst) >= self.max_active_sessions {
            self.active.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(limit = self.max_active_sessions, "Session limit reached");
            return Err(GameError::SessionLimitReached {
                limit: self.max_active_sessions,
            });
        }

        let mut state = SessionState::new();
        let published = match state.start(&self.generator) {
            Ok(published) => published,
            Err(e) => {
                self.active.fetch_sub(1, Ordering::SeqCst);
                return Err(e);
            }
        };

        let started_at = Utc::now();
        vacant.insert(SessionSlot { state, started_at });

        tracing::debug!(player_id = %key.player_id, game = %key.game, "Session registered");
        Ok(SessionStarted {
            player_id: key.player_id.clone(),
            game: key.game,
            commitment: published.commitment,
            client_seed: published.client_seed,
            started_at,
        })
    }

    /// Settle one round in the caller's session
    pub fn play(&self, key: &SessionKey, choice: &RawChoice) -> GameResult<PlayRecord> {
        self.settle(key, choice).map(|settled| settled.record)
    }

    /// Settle one round and report the client seed it was mixed with, both
    /// read under the same entry lock
    pub fn settle(&self, key: &SessionKey, choice: &RawChoice) -> GameResult<SettledPlay> {
        let mut slot = self
            .sessions
            .get_mut(key)
            .ok_or(GameError::NoActiveSession)?;
        let record = engine::play(key.game, &mut slot.state, choice)?;
        let client_seed = slot
            .state
            .client_seed()
            .ok_or(GameError::NoActiveSession)?
            .to_string();
        Ok(SettledPlay {
            record,
            client_seed,
        })
    }

    /// Close the caller's session and reveal its seeds
    pub fn end_session(&self, key: &SessionKey) -> GameResult<SessionReveal> {
        let (_, mut slot) = self
            .sessions
            .remove(key)
            .ok_or(GameError::NoActiveSession)?;
        self.active.fetch_sub(1, Ordering::SeqCst);
        slot.state.end()
    }

    pub fn status(&self, key: &SessionKey) -> GameResult<SessionStatus> {
        let slot = self.sessions.get(key).ok_or(GameError::NoActiveSession)?;
        let (Some(commitment), Some(client_seed), Some(nonce)) = (
            slot.state.commitment(),
            slot.state.client_seed(),
            slot.state.nonce(),
        ) else {
            return Err(GameError::NoActiveSession);
        };

        Ok(SessionStatus {
            player_id: key.player_id.clone(),
            game: key.game,
            commitment: commitment.to_string(),
            client_seed: client_seed.to_string(),
            nonce,
            started_at: slot.started_at,
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active_sessions(&self) -> usize {
        self.max_active_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::hasher;
    use crate::games::seed::tests::FlakySource;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn registry(limit: usize) -> SessionRegistry {
        SessionRegistry::new(SeedGenerator::default(), limit)
    }

    fn key(player: &str, game: GameType) -> SessionKey {
        SessionKey::new(player, game).unwrap()
    }

    #[test]
    fn test_player_id_validation() {
        assert!(SessionKey::new("", GameType::Dice).is_err());
        assert!(SessionKey::new("   ", GameType::Dice).is_err());
        assert!(SessionKey::new("a\nb", GameType::Dice).is_err());
        assert!(SessionKey::new("x".repeat(MAX_PLAYER_ID_LEN + 1), GameType::Dice).is_err());
        assert!(SessionKey::new("player-1", GameType::Dice).is_ok());
    }

    #[test]
    fn test_full_session_through_registry() {
        let registry = registry(10);
        let k = key("alice", GameType::CoinFlip);

        let started = registry.start_session(&k).unwrap();
        assert_eq!(registry.active_sessions(), 1);

        let records: Vec<_> = (0..3)
            .map(|_| registry.play(&k, &"heads".into()).unwrap())
            .collect();
        assert_eq!(registry.status(&k).unwrap().nonce, 3);

        let reveal = registry.end_session(&k).unwrap();
        assert_eq!(registry.active_sessions(), 0);
        assert_eq!(reveal.final_nonce, 3);
        assert_eq!(hasher::commitment(&reveal.server_seed), started.commitment);
        for record in &records {
            assert_eq!(
                record.commit_hash,
                hasher::commit_hash(&reveal.server_seed, &reveal.client_seed, record.nonce)
            );
        }

        assert_eq!(registry.play(&k, &"heads".into()), Err(GameError::NoActiveSession));
        assert_eq!(registry.end_session(&k), Err(GameError::NoActiveSession));
    }

    #[test]
    fn test_sessions_are_isolated_per_caller_and_game() {
        let registry = registry(10);
        let alice_coin = key("alice", GameType::CoinFlip);
        let alice_dice = key("alice", GameType::Dice);
        let bob_coin = key("bob", GameType::CoinFlip);

        let a = registry.start_session(&alice_coin).unwrap();
        let b = registry.start_session(&alice_dice).unwrap();
        let c = registry.start_session(&bob_coin).unwrap();
        assert_ne!(a.commitment, b.commitment);
        assert_ne!(a.commitment, c.commitment);

        registry.play(&alice_coin, &"tails".into()).unwrap();
        registry.play(&alice_coin, &"tails".into()).unwrap();
        registry.play(&bob_coin, &"heads".into()).unwrap();

        assert_eq!(registry.status(&alice_coin).unwrap().nonce, 2);
        assert_eq!(registry.status(&alice_dice).unwrap().nonce, 0);
        assert_eq!(registry.status(&bob_coin).unwrap().nonce, 1);
    }

    #[test]
    fn test_settle_reports_seed_of_the_playing_session() {
        let registry = registry(10);
        let k = key("frank", GameType::Dice);

        let first = registry.start_session(&k).unwrap();
        let settled = registry.settle(&k, &RawChoice::Number(50)).unwrap();
        assert_eq!(settled.client_seed, first.client_seed);
        assert!(settled.record.combined_input.contains(&first.client_seed));

        registry.end_session(&k).unwrap();
        let second = registry.start_session(&k).unwrap();
        let settled = registry.settle(&k, &RawChoice::Number(50)).unwrap();
        assert_eq!(settled.client_seed, second.client_seed);
        assert_ne!(settled.client_seed, first.client_seed);
        assert_eq!(settled.record.nonce, 1);

        assert_eq!(
            registry.settle(&key("nobody", GameType::Dice), &RawChoice::Number(50)),
            Err(GameError::NoActiveSession)
        );
    }

    #[test]
    fn test_double_start_keeps_first_session() {
        let registry = registry(10);
        let k = key("carol", GameType::Dice);
        let first = registry.start_session(&k).unwrap();
        assert_eq!(registry.start_session(&k), Err(GameError::SessionAlreadyActive));
        assert_eq!(registry.status(&k).unwrap().commitment, first.commitment);
        assert_eq!(registry.active_sessions(), 1);
    }

    #[test]
    fn test_session_limit() {
        let registry = registry(2);
        registry.start_session(&key("p1", GameType::Dice)).unwrap();
        registry.start_session(&key("p2", GameType::Dice)).unwrap();
        assert_eq!(
            registry.start_session(&key("p3", GameType::Dice)),
            Err(GameError::SessionLimitReached { limit: 2 })
        );

        registry.end_session(&key("p1", GameType::Dice)).unwrap();
        assert!(registry.start_session(&key("p3", GameType::Dice)).is_ok());
    }

    #[test]
    fn test_entropy_failure_leaves_no_session() {
        let registry = SessionRegistry::new(
            SeedGenerator::with_source(Arc::new(FlakySource::new(usize::MAX)), 32),
            10,
        );
        let k = key("dave", GameType::CoinFlip);
        assert!(matches!(
            registry.start_session(&k),
            Err(GameError::EntropySourceFailure(_))
        ));
        assert_eq!(registry.active_sessions(), 0);
        assert_eq!(registry.status(&k), Err(GameError::NoActiveSession));
    }

    #[test]
    fn test_concurrent_plays_never_share_a_nonce() {
        let registry = registry(10);
        let k = key("eve", GameType::Dice);
        registry.start_session(&k).unwrap();

        let threads = 8;
        let plays_per_thread = 50;
        let nonces: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    scope.spawn(|| {
                        (0..plays_per_thread)
                            .map(|_| registry.play(&k, &RawChoice::Number(50)).unwrap().nonce)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let total = (threads * plays_per_thread) as u64;
        let unique: HashSet<u64> = nonces.iter().copied().collect();
        assert_eq!(unique.len() as u64, total);
        assert_eq!(unique, (1..=total).collect::<HashSet<_>>());
        assert_eq!(registry.end_session(&k).unwrap().final_nonce, total);
    }
}
