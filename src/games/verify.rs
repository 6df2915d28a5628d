//! Verification surface
//!
//! Recomputes plays from revealed seeds. Nothing here needs the running
//! service: an auditor holding the published commitment, the reveal and the
//! reported records can check a whole session offline.

use crate::errors::GameResult;
use crate::games::engine;
use crate::games::hasher;
use crate::games::session::PendingPlay;
use crate::games::types::{GameType, PlayRecord, PlayResult, RawChoice, SessionReveal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// True when `server_seed` hashes to `commitment` (hex case is ignored)
pub fn verify_commitment(server_seed: &str, commitment: &str) -> bool {
    hasher::commitment(server_seed).eq_ignore_ascii_case(commitment.trim())
}

/// Recompute the record a play at `nonce` must have produced
pub fn replay(
    game: GameType,
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    choice: &RawChoice,
) -> GameResult<PlayRecord> {
    let combined_input = hasher::play_input(server_seed, client_seed, nonce);
    let pending = PendingPlay {
        nonce,
        commit_hash: hasher::sha256_hex(combined_input.as_bytes()),
        combined_input,
    };
    engine::settle(game, &pending, choice)
}

/// Choice the player made in a reported record
pub fn reported_choice(result: &PlayResult) -> RawChoice {
    match result {
        PlayResult::CoinFlip { player_choice, .. } => (*player_choice).into(),
        PlayResult::Dice { player_choice, .. } => (*player_choice).into(),
    }
}

/// A reported record that does not survive recomputation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditMismatch {
    pub nonce: u64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<PlayRecord>,
}

/// Outcome of auditing one revealed session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditReport {
    /// Revealed server seed hashes to the commitment published at start
    pub commitment_valid: bool,
    /// Records that recomputed identically
    pub verified: usize,
    pub mismatches: Vec<AuditMismatch>,
    /// Nonces in `1..=final_nonce` with no reported record
    pub missing_nonces: Vec<u64>,
    /// Reported nonces outside `1..=final_nonce` or reported twice
    pub unexpected_nonces: Vec<u64>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.commitment_valid
            && self.mismatches.is_empty()
            && self.missing_nonces.is_empty()
            && self.unexpected_nonces.is_empty()
    }
}

/// Replay every reported record of a revealed session.
///
/// `published_commitment` is the hash the player saw at session start; the
/// reveal's own commitment field is not trusted.
pub fn audit_session(
    published_commitment: &str,
    reveal: &SessionReveal,
    records: &[PlayRecord],
) -> AuditReport {
    let commitment_valid = verify_commitment(&reveal.server_seed, published_commitment);
    let mut verified = 0;
    let mut mismatches = Vec::new();
    let mut unexpected_nonces = Vec::new();
    let mut seen = HashSet::new();

    for record in records {
        if record.nonce == 0 || record.nonce > reveal.final_nonce || !seen.insert(record.nonce) {
            unexpected_nonces.push(record.nonce);
            continue;
        }

        let choice = reported_choice(&record.result);
        match replay(
            record.game(),
            &reveal.server_seed,
            &reveal.client_seed,
            record.nonce,
            &choice,
        ) {
            Ok(expected) if expected == *record => verified += 1,
            Ok(expected) => mismatches.push(AuditMismatch {
                nonce: record.nonce,
                reason: describe_difference(&expected, record),
                expected: Some(expected),
            }),
            Err(e) => mismatches.push(AuditMismatch {
                nonce: record.nonce,
                reason: format!("replay failed: {}", e),
                expected: None,
            }),
        }
    }

    let missing_nonces = (1..=reveal.final_nonce)
        .filter(|n| !seen.contains(n))
        .collect();

    let report = AuditReport {
        commitment_valid,
        verified,
        mismatches,
        missing_nonces,
        unexpected_nonces,
    };

    if report.is_clean() {
        tracing::info!(verified = report.verified, "Session audit passed");
    } else {
        tracing::warn!(
            commitment_valid = report.commitment_valid,
            mismatches = report.mismatches.len(),
            missing = report.missing_nonces.len(),
            unexpected = report.unexpected_nonces.len(),
            "Session audit found discrepancies"
        );
    }
    report
}

fn describe_difference(expected: &PlayRecord, reported: &PlayRecord) -> String {
    if expected.combined_input != reported.combined_input {
        "hash preimage differs".to_string()
    } else if expected.commit_hash != reported.commit_hash {
        "commit hash differs".to_string()
    } else if expected.result != reported.result {
        "derived result differs".to_string()
    } else {
        "win flag differs".to_string()
    }
}
