use crate::errors::{GameError, GameResult};
use crate::games::outcome::Multiplier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    CoinFlip,
    Dice,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::CoinFlip => write!(f, "coinflip"),
            GameType::Dice => write!(f, "dice"),
        }
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coinflip" | "coin" => Ok(GameType::CoinFlip),
            "dice" => Ok(GameType::Dice),
            other => Err(format!("unknown game '{}'", other)),
        }
    }
}

/// Side of a coin, used both as the player's pick and as the flip result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    /// Even values land on heads, odd values on tails
    pub fn from_parity(value: u64) -> Self {
        if value % 2 == 0 {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

/// "Roll under" threshold for a dice bet, always within `[MIN, MAX]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "i64")]
pub struct DiceTarget(u8);

impl DiceTarget {
    pub const MIN: u8 = 2;
    pub const MAX: u8 = 98;

    pub fn new(value: i64) -> GameResult<Self> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(GameError::invalid_choice(
                GameType::Dice,
                format!(
                    "target must be an integer between {} and {}, got {}",
                    Self::MIN,
                    Self::MAX,
                    value
                ),
            ));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for DiceTarget {
    type Error = GameError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        DiceTarget::new(value)
    }
}

impl From<DiceTarget> for i64 {
    fn from(target: DiceTarget) -> Self {
        i64::from(target.0)
    }
}

impl fmt::Display for DiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player input as it arrives from a caller, before game-specific validation.
///
/// Any JSON value deserializes; shapes no game accepts land in `Other` and
/// are rejected by the game's choice parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawChoice {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for RawChoice {
    fn default() -> Self {
        RawChoice::Other(serde_json::Value::Null)
    }
}

impl fmt::Display for RawChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawChoice::Number(n) => write!(f, "{}", n),
            RawChoice::Text(s) => write!(f, "{}", s),
            RawChoice::Other(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for RawChoice {
    fn from(s: &str) -> Self {
        RawChoice::Text(s.to_string())
    }
}

impl From<i64> for RawChoice {
    fn from(n: i64) -> Self {
        RawChoice::Number(n)
    }
}

impl From<CoinSide> for RawChoice {
    fn from(side: CoinSide) -> Self {
        RawChoice::Text(side.to_string())
    }
}

impl From<DiceTarget> for RawChoice {
    fn from(target: DiceTarget) -> Self {
        RawChoice::Number(target.into())
    }
}

/// Which branch of a derivation produced an outcome.
///
/// `Fallback` only appears when the primary hash slice was unparseable and is
/// always surfaced to callers so it can never pass for a normal result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DerivationPath {
    Primary,
    Fallback,
}

/// Game-specific part of a settled play
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum PlayResult {
    CoinFlip {
        player_choice: CoinSide,
        outcome: CoinSide,
        derivation: DerivationPath,
    },
    Dice {
        player_choice: DiceTarget,
        roll: u8,
        multiplier: Multiplier,
    },
}

impl PlayResult {
    pub fn game(&self) -> GameType {
        match self {
            PlayResult::CoinFlip { .. } => GameType::CoinFlip,
            PlayResult::Dice { .. } => GameType::Dice,
        }
    }
}

/// Verifiable record of one settled play.
///
/// Everything an auditor needs to recompute the result once the server seed
/// is revealed: the exact hash preimage, its digest and the derived outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayRecord {
    pub nonce: u64,
    pub combined_input: String,
    pub commit_hash: String,
    pub result: PlayResult,
    pub win: bool,
}

impl PlayRecord {
    pub fn game(&self) -> GameType {
        self.result.game()
    }
}

/// Public half of a freshly started session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCommitment {
    /// SHA-256 of the hidden server seed
    pub commitment: String,
    pub client_seed: String,
}

/// Everything disclosed when a session ends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionReveal {
    pub server_seed: String,
    pub client_seed: String,
    pub commitment: String,
    pub final_nonce: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_type_round_trip_names() {
        assert_eq!("coinflip".parse::<GameType>().unwrap(), GameType::CoinFlip);
        assert_eq!("coin".parse::<GameType>().unwrap(), GameType::CoinFlip);
        assert_eq!("dice".parse::<GameType>().unwrap(), GameType::Dice);
        assert!("roulette".parse::<GameType>().is_err());
        assert_eq!(serde_json::to_string(&GameType::CoinFlip).unwrap(), "\"coinflip\"");
    }

    #[test]
    fn test_dice_target_bounds() {
        assert!(DiceTarget::new(1).is_err());
        assert!(DiceTarget::new(99).is_err());
        assert_eq!(DiceTarget::new(2).unwrap().value(), 2);
        assert_eq!(DiceTarget::new(98).unwrap().value(), 98);
        assert!(serde_json::from_str::<DiceTarget>("150").is_err());
    }

    #[test]
    fn test_raw_choice_accepts_numbers_and_strings() {
        let n: RawChoice = serde_json::from_str("50").unwrap();
        assert_eq!(n, RawChoice::Number(50));
        let s: RawChoice = serde_json::from_str("\"heads\"").unwrap();
        assert_eq!(s, RawChoice::Text("heads".to_string()));
    }

    #[test]
    fn test_raw_choice_keeps_unsupported_shapes() {
        for text in ["50.5", "true", "null", "1e10", "[50]"] {
            let choice: RawChoice = serde_json::from_str(text).unwrap();
            assert!(matches!(choice, RawChoice::Other(_)), "{}", text);
        }
        assert_eq!(RawChoice::default(), RawChoice::Other(serde_json::Value::Null));
    }

    #[test]
    fn test_play_result_is_tagged_by_game() {
        let result = PlayResult::CoinFlip {
            player_choice: CoinSide::Heads,
            outcome: CoinSide::Tails,
            derivation: DerivationPath::Primary,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["game"], "coinflip");
        assert_eq!(json["outcome"], "tails");
        assert_eq!(result.game(), GameType::CoinFlip);
    }
}
