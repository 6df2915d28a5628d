//! Offline verifier for revealed sessions
//!
//! Recomputes a single play, or audits a saved list of play records,
//! from the seeds a session revealed when it ended.

use clap::Parser;
use fairflip::games::{
    audit_session, types::SessionReveal, verify, verify_commitment, GameType, PlayRecord,
    PlayResult, RawChoice,
};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "verify-session")]
#[command(about = "Verify fairflip plays from revealed seeds", long_about = None)]
struct Args {
    /// Game of the session (coinflip or dice)
    #[arg(long)]
    game: GameType,

    /// Revealed server seed
    #[arg(long)]
    server_seed: String,

    /// Revealed client seed
    #[arg(long)]
    client_seed: String,

    /// Commitment published when the session started
    #[arg(long)]
    commitment: Option<String>,

    /// Nonce of a single play to recompute
    #[arg(long, requires = "choice", conflicts_with = "records")]
    nonce: Option<u64>,

    /// Player choice of that play ("heads", "tails" or a dice target)
    #[arg(long)]
    choice: Option<String>,

    /// JSON file holding an array of play records to audit
    #[arg(long, requires_all = ["final_nonce", "commitment"])]
    records: Option<String>,

    /// Final nonce reported when the session ended
    #[arg(long)]
    final_nonce: Option<u64>,
}

fn main() {
    let args = Args::parse();

    println!("🔍 Fairflip Session Verification");
    println!("================================");
    println!("Game: {}\n", args.game);

    let clean = match (&args.records, args.nonce) {
        (Some(path), _) => audit_records(&args, path),
        (None, Some(nonce)) => replay_single(&args, nonce),
        (None, None) => check_commitment_only(&args),
    };

    match clean {
        Ok(true) => println!("\n✅ SESSION VERIFIED"),
        Ok(false) => {
            println!("\n❌ VERIFICATION FAILED");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(2);
        }
    }
}

fn print_commitment(args: &Args) -> bool {
    match &args.commitment {
        Some(commitment) if verify_commitment(&args.server_seed, commitment) => {
            println!("   ✅ Server seed matches commitment {}", commitment);
            true
        }
        Some(commitment) => {
            println!("   ❌ Server seed does NOT hash to {}", commitment);
            false
        }
        None => {
            println!("   ⚠️  No commitment given, skipping commitment check");
            true
        }
    }
}

fn check_commitment_only(args: &Args) -> Result<bool, String> {
    if args.commitment.is_none() {
        return Err("Nothing to verify: pass --commitment, --nonce or --records".to_string());
    }
    Ok(print_commitment(args))
}

fn replay_single(args: &Args, nonce: u64) -> Result<bool, String> {
    let choice = args
        .choice
        .as_deref()
        .map(RawChoice::from)
        .ok_or_else(|| "--choice is required with --nonce".to_string())?;

    let commitment_ok = print_commitment(args);
    let record = verify::replay(
        args.game,
        &args.server_seed,
        &args.client_seed,
        nonce,
        &choice,
    )
    .map_err(|e| e.to_string())?;

    println!("\n🎲 Play #{}", record.nonce);
    print_record(&record);
    Ok(commitment_ok)
}

fn audit_records(args: &Args, path: &str) -> Result<bool, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    let records: Vec<PlayRecord> =
        serde_json::from_str(&content).map_err(|e| format!("Invalid records file: {}", e))?;

    if let Some(other) = records.iter().find(|r| r.game() != args.game) {
        return Err(format!(
            "Record #{} is a {} play, expected {}",
            other.nonce,
            other.game(),
            args.game
        ));
    }

    let published = args.commitment.clone().unwrap_or_default();
    let reveal = SessionReveal {
        server_seed: args.server_seed.clone(),
        client_seed: args.client_seed.clone(),
        commitment: published.clone(),
        final_nonce: args.final_nonce.unwrap_or_default(),
    };

    print_commitment(args);
    let report = audit_session(&published, &reveal, &records);

    println!("\n📊 Audit Summary:");
    println!("   Records checked: {}", records.len());
    println!("   Verified: {}", report.verified);
    for mismatch in &report.mismatches {
        println!("   ❌ Nonce {}: {}", mismatch.nonce, mismatch.reason);
        if let Some(expected) = &mismatch.expected {
            print_record(expected);
        }
    }
    if !report.missing_nonces.is_empty() {
        println!("   ❌ Missing nonces: {:?}", report.missing_nonces);
    }
    if !report.unexpected_nonces.is_empty() {
        println!("   ❌ Unexpected nonces: {:?}", report.unexpected_nonces);
    }

    Ok(report.is_clean())
}

fn print_record(record: &PlayRecord) {
    println!("      Input: {}", record.combined_input);
    println!("      Hash:  {}", record.commit_hash);
    match &record.result {
        PlayResult::CoinFlip {
            player_choice,
            outcome,
            derivation,
        } => {
            println!(
                "      Choice: {}  Outcome: {}  ({:?})",
                player_choice, outcome, derivation
            );
        }
        PlayResult::Dice {
            player_choice,
            roll,
            multiplier,
        } => {
            println!(
                "      Target: {}  Roll: {}  Multiplier: {}x",
                player_choice.value(),
                roll,
                multiplier
            );
        }
    }
    println!("      Win: {}", record.win);
}
