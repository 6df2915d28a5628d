//! Request Handlers
//!
//! Thin adapters between JSON and the session registry. All game work is
//! synchronous in-memory hashing, so handlers call the registry directly.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::games::{
    registry::{SessionKey, SessionRegistry, SessionStatus},
    types::GameType,
    verify,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub version: String,
}

fn parse_game(request_id: &RequestId, game: &str) -> Result<GameType, ApiError> {
    game.parse::<GameType>()
        .map_err(|e| ApiError::not_found(request_id.0.clone(), e))
}

fn session_key(request_id: &RequestId, player_id: String, game: GameType) -> Result<SessionKey, ApiError> {
    SessionKey::new(player_id, game).map_err(|e| ApiError::from_game(request_id.0.clone(), e))
}

/// Unwrap a JSON body, turning extractor rejections into the error envelope
fn json_body<T>(request_id: &RequestId, payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(request_id.0.clone(), rejection.body_text()))
}

/// Health check handler
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
        active_sessions: state.registry.active_sessions(),
    })
}

/// Open a session and publish the server seed commitment
/// POST /api/:game/start_session
pub async fn start_session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game): Path<String>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    let game = parse_game(&request_id, &game)?;
    let request = json_body(&request_id, payload)?;
    let key = session_key(&request_id, request.player_id, game)?;

    let started = state
        .registry
        .start_session(&key)
        .map_err(|e| ApiError::from_game(request_id.0.clone(), e))?;

    Ok(Json(StartSessionResponse {
        player_id: started.player_id,
        game: started.game,
        hashed_server_seed: started.commitment,
        client_seed: started.client_seed,
        started_at: started.started_at,
        message: format!(
            "New {} session started. Every play uses the provided client seed.",
            game
        ),
    }))
}

/// Settle one round
/// POST /api/:game/play
pub async fn play_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game): Path<String>,
    payload: Result<Json<PlayRequest>, JsonRejection>,
) -> Result<Json<PlayResponse>, ApiError> {
    let game = parse_game(&request_id, &game)?;
    let request = json_body(&request_id, payload)?;
    let key = session_key(&request_id, request.player_id, game)?;

    let settled = state
        .registry
        .settle(&key, &request.player_choice)
        .map_err(|e| ApiError::from_game(request_id.0.clone(), e))?;

    Ok(Json(PlayResponse {
        player_id: key.player_id,
        record: settled.record,
        client_seed_used: settled.client_seed,
        settled_at: Utc::now(),
        message: "Play settled.".to_string(),
    }))
}

/// Close the session and reveal its seeds
/// POST /api/:game/end_session
pub async fn end_session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game): Path<String>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<EndSessionResponse>, ApiError> {
    let game = parse_game(&request_id, &game)?;
    let request = json_body(&request_id, payload)?;
    let key = session_key(&request_id, request.player_id, game)?;

    let reveal = state
        .registry
        .end_session(&key)
        .map_err(|e| ApiError::from_game(request_id.0.clone(), e))?;

    Ok(Json(EndSessionResponse {
        player_id: key.player_id,
        game,
        revealed_server_seed: reveal.server_seed,
        revealed_client_seed: reveal.client_seed,
        hashed_server_seed: reveal.commitment,
        final_nonce: reveal.final_nonce,
        message: "Seeds revealed. Session ended. All past plays can now be verified.".to_string(),
    }))
}

/// Public state of a running session
/// GET /api/:game/session/:player_id
pub async fn session_status_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path((game, player_id)): Path<(String, String)>,
) -> Result<Json<SessionStatus>, ApiError> {
    let game = parse_game(&request_id, &game)?;
    let key = session_key(&request_id, player_id, game)?;

    state
        .registry
        .status(&key)
        .map(Json)
        .map_err(|e| ApiError::from_game(request_id.0.clone(), e))
}

/// Recompute a play from revealed seeds
/// POST /api/verify
pub async fn verify_handler(
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let request = json_body(&request_id, payload)?;
    if request.nonce == 0 {
        return Err(ApiError::bad_request(
            request_id.0.clone(),
            "Nonces start at 1".to_string(),
        ));
    }

    let record = verify::replay(
        request.game,
        &request.server_seed,
        &request.client_seed,
        request.nonce,
        &request.player_choice,
    )
    .map_err(|e| ApiError::from_game(request_id.0.clone(), e))?;

    let commitment_valid = request
        .commitment
        .as_deref()
        .map(|c| verify::verify_commitment(&request.server_seed, c));

    Ok(Json(VerifyResponse {
        record,
        commitment_valid,
    }))
}
