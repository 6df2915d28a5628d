//! Full session lifecycle through the registry
//! Plays a session, reveals it and audits every record offline

use fairflip::games::{
    audit_session, hasher, types::CoinSide, GameType, PlayRecord, PlayResult, RawChoice,
    SeedGenerator, SessionKey, SessionRegistry,
};
use std::sync::Arc;

fn registry() -> SessionRegistry {
    SessionRegistry::new(SeedGenerator::new(32), 100)
}

#[test]
fn test_revealed_session_audits_clean() {
    let registry = registry();
    let key = SessionKey::new("alice", GameType::CoinFlip).unwrap();

    let started = registry.start_session(&key).unwrap();
    let records: Vec<PlayRecord> = ["heads", "tails", "tails", "heads", "heads"]
        .iter()
        .map(|c| registry.play(&key, &RawChoice::from(*c)).unwrap())
        .collect();
    let reveal = registry.end_session(&key).unwrap();

    assert_eq!(reveal.final_nonce, 5);
    assert_eq!(hasher::commitment(&reveal.server_seed), started.commitment);
    assert_eq!(reveal.client_seed, started.client_seed);

    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.nonce, i as u64 + 1);
        assert_eq!(
            record.combined_input,
            format!("{}-{}-{}", reveal.server_seed, reveal.client_seed, record.nonce)
        );
        assert_eq!(record.commit_hash, hasher::sha256_hex(record.combined_input.as_bytes()));
    }

    let report = audit_session(&started.commitment, &reveal, &records);
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.verified, 5);
}

#[test]
fn test_audit_catches_tampering() {
    let registry = registry();
    let key = SessionKey::new("bob", GameType::CoinFlip).unwrap();

    let started = registry.start_session(&key).unwrap();
    let mut records: Vec<PlayRecord> = (0..4)
        .map(|_| registry.play(&key, &RawChoice::from("heads")).unwrap())
        .collect();
    let reveal = registry.end_session(&key).unwrap();

    // Flip the reported outcome of the second play and hide the last one
    if let PlayResult::CoinFlip { outcome, .. } = &mut records[1].result {
        *outcome = match outcome {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        };
    }
    records.pop();

    let report = audit_session(&started.commitment, &reveal, &records);
    assert!(!report.is_clean());
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].nonce, 2);
    assert_eq!(report.missing_nonces, vec![4]);

    let forged = audit_session(&hasher::commitment("forged"), &reveal, &records);
    assert!(!forged.commitment_valid);
}

#[test]
fn test_sessions_are_independent() {
    let registry = registry();
    let coin = SessionKey::new("carol", GameType::CoinFlip).unwrap();
    let dice = SessionKey::new("carol", GameType::Dice).unwrap();
    let other = SessionKey::new("dave", GameType::Dice).unwrap();

    let a = registry.start_session(&coin).unwrap();
    let b = registry.start_session(&dice).unwrap();
    let c = registry.start_session(&other).unwrap();
    assert_ne!(a.commitment, b.commitment);
    assert_ne!(b.commitment, c.commitment);
    assert_eq!(registry.active_sessions(), 3);

    registry.play(&dice, &RawChoice::Number(60)).unwrap();
    registry.play(&dice, &RawChoice::Number(60)).unwrap();
    assert_eq!(registry.status(&dice).unwrap().nonce, 2);
    assert_eq!(registry.status(&other).unwrap().nonce, 0);
    assert_eq!(registry.status(&coin).unwrap().nonce, 0);

    registry.end_session(&coin).unwrap();
    assert_eq!(registry.active_sessions(), 2);
    assert!(registry.play(&coin, &RawChoice::from("heads")).is_err());
    assert!(registry.play(&dice, &RawChoice::Number(60)).is_ok());
}

#[test]
fn test_restart_after_end_uses_fresh_seeds() {
    let registry = registry();
    let key = SessionKey::new("erin", GameType::Dice).unwrap();

    let first = registry.start_session(&key).unwrap();
    registry.play(&key, &RawChoice::Number(50)).unwrap();
    let first_reveal = registry.end_session(&key).unwrap();

    let second = registry.start_session(&key).unwrap();
    assert_ne!(first.commitment, second.commitment);
    let record = registry.play(&key, &RawChoice::Number(50)).unwrap();
    assert_eq!(record.nonce, 1);
    assert!(!record.combined_input.starts_with(&first_reveal.server_seed));
}

#[tokio::test]
async fn test_concurrent_players_keep_sequential_nonces() {
    let registry = Arc::new(registry());
    let mut handles = Vec::new();

    for player in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let key = SessionKey::new(format!("player-{}", player), GameType::Dice).unwrap();
            let started = registry.start_session(&key).unwrap();
            let records: Vec<PlayRecord> = (0..25)
                .map(|_| registry.play(&key, &RawChoice::Number(50)).unwrap())
                .collect();
            let reveal = registry.end_session(&key).unwrap();
            audit_session(&started.commitment, &reveal, &records)
        }));
    }

    for handle in handles {
        let report = handle.await.unwrap();
        assert!(report.is_clean(), "{:?}", report);
        assert_eq!(report.verified, 25);
    }
    assert_eq!(registry.active_sessions(), 0);
}
