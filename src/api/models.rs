//! API Request/Response Models
//!
//! JSON shapes of the game endpoints.

use crate::games::types::{GameType, PlayRecord, RawChoice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
}

/// Body of start/end session calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub player_id: String,
    pub game: GameType,
    /// Commitment to the hidden server seed
    pub hashed_server_seed: String,
    /// Client seed mixed into every play of this session
    pub client_seed: String,
    pub started_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    pub player_id: String,
    #[serde(default)]
    pub player_choice: RawChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayResponse {
    pub player_id: String,
    #[serde(flatten)]
    pub record: PlayRecord,
    pub client_seed_used: String,
    pub settled_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub player_id: String,
    pub game: GameType,
    pub revealed_server_seed: String,
    pub revealed_client_seed: String,
    pub hashed_server_seed: String,
    pub final_nonce: u64,
    pub message: String,
}

/// Recompute a single play from revealed seeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub game: GameType,
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    #[serde(default)]
    pub player_choice: RawChoice,
    /// Commitment published at session start, checked when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(flatten)]
    pub record: PlayRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment_valid: Option<bool>,
}
