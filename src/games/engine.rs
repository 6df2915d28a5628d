//! Game engine
//!
//! Settles one round against a borrowed session: validate the choice, derive
//! the outcome for `nonce + 1`, then advance the nonce. One engine type serves
//! every game; the game itself is the `OutcomeDeriver` strategy.

use crate::errors::GameResult;
use crate::games::outcome::{CoinOutcome, DiceOutcome, OutcomeDeriver};
use crate::games::session::{PendingPlay, SessionState};
use crate::games::types::{GameType, PlayRecord, RawChoice};
use std::marker::PhantomData;

/// Plays rounds of the game described by `D`
pub struct GameEngine<D: OutcomeDeriver> {
    _game: PhantomData<D>,
}

impl<D: OutcomeDeriver> GameEngine<D> {
    pub fn new() -> Self {
        Self { _game: PhantomData }
    }

    pub fn game_type(&self) -> GameType {
        D::GAME
    }

    /// Settle one round.
    ///
    /// Checks run in order: session active, choice in domain, outcome
    /// derivable. Any failure leaves the nonce untouched.
    pub fn play(&self, session: &mut SessionState, choice: &RawChoice) -> GameResult<PlayRecord> {
        session.ensure_active()?;
        let choice = D::parse_choice(choice)?;

        let record = session.play_with(|pending| self.settle(pending, choice))?;

        tracing::info!(
            game = %D::GAME,
            nonce = record.nonce,
            win = record.win,
            commit_hash = %record.commit_hash,
            "Play settled"
        );
        Ok(record)
    }

    /// Derive the record for already computed hash inputs
    pub fn settle(&self, pending: &PendingPlay, choice: D::Choice) -> GameResult<PlayRecord> {
        let derivation = D::derive(&pending.commit_hash)?;
        let win = D::is_win(&choice, &derivation.outcome);
        Ok(PlayRecord {
            nonce: pending.nonce,
            combined_input: pending.combined_input.clone(),
            commit_hash: pending.commit_hash.clone(),
            result: D::play_result(choice, derivation),
            win,
        })
    }
}

impl<D: OutcomeDeriver> Default for GameEngine<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: OutcomeDeriver> Clone for GameEngine<D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<D: OutcomeDeriver> Copy for GameEngine<D> {}

impl<D: OutcomeDeriver> std::fmt::Debug for GameEngine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GameEngine<{}>", D::GAME)
    }
}

/// Runtime selection over the supported games
pub fn play(game: GameType, session: &mut SessionState, choice: &RawChoice) -> GameResult<PlayRecord> {
    match game {
        GameType::CoinFlip => GameEngine::<CoinOutcome>::new().play(session, choice),
        GameType::Dice => GameEngine::<DiceOutcome>::new().play(session, choice),
    }
}

/// Settle `pending` for `game` without touching any session
pub fn settle(game: GameType, pending: &PendingPlay, choice: &RawChoice) -> GameResult<PlayRecord> {
    match game {
        GameType::CoinFlip => {
            let choice = CoinOutcome::parse_choice(choice)?;
            GameEngine::<CoinOutcome>::new().settle(pending, choice)
        }
        GameType::Dice => {
            let choice = DiceOutcome::parse_choice(choice)?;
            GameEngine::<DiceOutcome>::new().settle(pending, choice)
        }
    }
}
