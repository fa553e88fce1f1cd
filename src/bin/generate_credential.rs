//! Generate a fresh voter credential
//!
//! Prints the credential as JSON on stdout. Only `commitment` is submitted at
//! registration; keep `nullifier` and `secret` private until voting.
//!
//! Usage: generate_credential [OUTPUT_FILE]

use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;
use zk_vote_accumulator::{generate_credential, PoseidonHash};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let credential = generate_credential(&PoseidonHash)?;
    info!(commitment = ?credential.commitment, "generated credential");

    let json = serde_json::to_string_pretty(&credential)?;
    match std::env::args().nth(1) {
        Some(path) => {
            fs::write(&path, json)?;
            info!(%path, "credential written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
