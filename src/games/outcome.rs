//! Outcome derivation
//!
//! Pure mappings from a play's commit hash to a game result. Both games read a
//! hex prefix of the digest; they differ only in how that number becomes an
//! outcome. Any verifier, in any language, must reproduce these rules exactly,
//! including the floating point steps of the dice roll.

use crate::errors::{GameError, GameResult};
use crate::games::types::{CoinSide, DerivationPath, DiceTarget, GameType, PlayResult, RawChoice};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex characters of the digest read by a coin flip (32 bits)
pub const COIN_HEX_CHARS: usize = 8;

/// Hex characters of the digest read by a dice roll (52 bits)
pub const DICE_HEX_CHARS: usize = 13;

/// 16^13, the exclusive upper bound of a dice slice
const DICE_SCALE: f64 = 4_503_599_627_370_496.0;

/// Numerator of the payout formula `99 / target`; the missing 1% is the house edge
const PAYOUT_NUMERATOR: f64 = 99.0;

/// An outcome together with the branch that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation<T> {
    pub outcome: T,
    pub path: DerivationPath,
}

impl<T> Derivation<T> {
    fn primary(outcome: T) -> Self {
        Self {
            outcome,
            path: DerivationPath::Primary,
        }
    }
}

/// Strategy that turns a commit hash into a result for one game
pub trait OutcomeDeriver {
    /// Validated player input
    type Choice: Copy + fmt::Debug;
    /// Game result before it is compared to the choice
    type Outcome: Copy + fmt::Debug;

    const GAME: GameType;

    /// Check raw player input against the game's domain
    fn parse_choice(raw: &RawChoice) -> GameResult<Self::Choice>;

    /// Derive the outcome from a hex digest
    fn derive(commit_hash: &str) -> GameResult<Derivation<Self::Outcome>>;

    fn is_win(choice: &Self::Choice, outcome: &Self::Outcome) -> bool;

    fn play_result(choice: Self::Choice, derivation: Derivation<Self::Outcome>) -> PlayResult;
}

/// Parse the first `len` characters of `digest` as hex. Signs, whitespace and
/// short digests are rejected.
fn parse_hex_prefix(digest: &str, len: usize) -> Option<u64> {
    let slice = digest.get(..len)?;
    if slice.len() != len || !slice.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(slice, 16).ok()
}

/// Heads on an even 32-bit prefix, tails on odd
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinOutcome;

impl OutcomeDeriver for CoinOutcome {
    type Choice = CoinSide;
    type Outcome = CoinSide;

    const GAME: GameType = GameType::CoinFlip;

    fn parse_choice(raw: &RawChoice) -> GameResult<CoinSide> {
        match raw {
            RawChoice::Text(s) if s == "heads" => Ok(CoinSide::Heads),
            RawChoice::Text(s) if s == "tails" => Ok(CoinSide::Tails),
            other => Err(GameError::invalid_choice(
                GameType::CoinFlip,
                format!("must be 'heads' or 'tails', got '{}'", other),
            )),
        }
    }

    fn derive(commit_hash: &str) -> GameResult<Derivation<CoinSide>> {
        if let Some(value) = parse_hex_prefix(commit_hash, COIN_HEX_CHARS) {
            return Ok(Derivation::primary(CoinSide::from_parity(value)));
        }

        // Unreachable for a well-formed SHA-256 hex digest.
        let last = commit_hash
            .chars()
            .last()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| {
                GameError::MalformedDigest(format!(
                    "coin slice and fallback character are not hex: '{}'",
                    commit_hash
                ))
            })?;

        tracing::warn!(
            commit_hash = %commit_hash,
            "Coin prefix is not valid hex; outcome taken from fallback character"
        );
        Ok(Derivation {
            outcome: CoinSide::from_parity(u64::from(last)),
            path: DerivationPath::Fallback,
        })
    }

    fn is_win(choice: &CoinSide, outcome: &CoinSide) -> bool {
        choice == outcome
    }

    fn play_result(choice: CoinSide, derivation: Derivation<CoinSide>) -> PlayResult {
        PlayResult::CoinFlip {
            player_choice: choice,
            outcome: derivation.outcome,
            derivation: derivation.path,
        }
    }
}

/// Roll in `[1, 100]` from a 52-bit prefix; the player wins when `roll < target`
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceOutcome;

impl DiceOutcome {
    /// `floor((v / 16^13) * 100) + 1`, evaluated in double precision
    pub fn roll_from_prefix(value: u64) -> u8 {
        let fraction = value as f64 / DICE_SCALE;
        (fraction * 100.0).floor() as u8 + 1
    }
}

impl OutcomeDeriver for DiceOutcome {
    type Choice = DiceTarget;
    type Outcome = u8;

    const GAME: GameType = GameType::Dice;

    fn parse_choice(raw: &RawChoice) -> GameResult<DiceTarget> {
        match raw {
            RawChoice::Number(n) => DiceTarget::new(*n),
            RawChoice::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                let n = s.parse::<i64>().map_err(|_| {
                    GameError::invalid_choice(GameType::Dice, format!("'{}' is out of range", s))
                })?;
                DiceTarget::new(n)
            }
            RawChoice::Text(s) => Err(GameError::invalid_choice(
                GameType::Dice,
                format!("target must be an integer, got '{}'", s),
            )),
            RawChoice::Other(v) => Err(GameError::invalid_choice(
                GameType::Dice,
                format!("target must be an integer, got {}", v),
            )),
        }
    }

    fn derive(commit_hash: &str) -> GameResult<Derivation<u8>> {
        let value = parse_hex_prefix(commit_hash, DICE_HEX_CHARS).ok_or_else(|| {
            GameError::MalformedDigest(format!("dice slice is not hex: '{}'", commit_hash))
        })?;
        Ok(Derivation::primary(Self::roll_from_prefix(value)))
    }

    fn is_win(choice: &DiceTarget, roll: &u8) -> bool {
        *roll < choice.value()
    }

    fn play_result(choice: DiceTarget, derivation: Derivation<u8>) -> PlayResult {
        PlayResult::Dice {
            player_choice: choice,
            roll: derivation.outcome,
            multiplier: Multiplier::for_target(choice),
        }
    }
}

/// Payout multiplier with exactly two decimal places, stored in hundredths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Multiplier {
    hundredths: u32,
}

impl Multiplier {
    pub fn from_hundredths(hundredths: u32) -> Self {
        Self { hundredths }
    }

    /// `99 / target` rounded to two places.
    ///
    /// The quotient is taken as a double and rounded half-up on that double's
    /// exact binary value, so 99/40 (stored as 2.47500000000000008...) gives
    /// 2.48 and 99/8 (exactly 12.375) gives 12.38.
    pub fn for_target(target: DiceTarget) -> Self {
        let quotient = PAYOUT_NUMERATOR / f64::from(target.value());
        Self {
            hundredths: hundredths_half_up(quotient),
        }
    }

    pub fn hundredths(self) -> u32 {
        self.hundredths
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.hundredths) / 100.0
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl From<Multiplier> for f64 {
    fn from(m: Multiplier) -> Self {
        m.as_f64()
    }
}

impl TryFrom<f64> for Multiplier {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) / 100.0 {
            return Err(format!("multiplier out of range: {}", value));
        }
        Ok(Self {
            hundredths: (value * 100.0).round() as u32,
        })
    }
}

/// Round a positive finite double to hundredths, ties away from zero, using
/// the double's exact value rather than its shortest decimal rendering.
fn hundredths_half_up(value: f64) -> u32 {
    if !(value.is_finite() && value > 0.0) {
        return 0;
    }

    let bits = value.to_bits();
    let biased_exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased_exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exponent - 1075)
    };

    // value == mantissa * 2^exponent
    let scaled = u128::from(mantissa) * 100;
    if exponent >= 0 {
        return (scaled << exponent.min(64)) as u32;
    }

    let shift = (-exponent) as u32;
    if shift >= 127 {
        return 0;
    }
    let whole = scaled >> shift;
    let remainder = scaled - (whole << shift);
    let half = 1u128 << (shift - 1);
    let rounded = if remainder >= half { whole + 1 } else { whole };
    rounded as u32
}
