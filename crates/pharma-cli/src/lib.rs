//! # pharma-cli: Audit CLI for PharmaChain
//!
//! The `pharmachain` binary reads a persisted [`LedgerSnapshot`], restores it
//! (which replays and checks every history), and answers audit questions.
//! It never submits transactions.
//!
//! ```bash
//! pharmachain --snapshot ledger.json verify
//! pharmachain --config chain.yaml trace batch:3
//! pharmachain --snapshot ledger.json --json history 3
//! pharmachain --snapshot ledger.json role 5f0c...e1
//! ```
//!
//! Exit codes: `0` success, `1` error, `2` integrity failure found by `verify`.

pub mod audit;
pub mod registry;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use pharma_ledger::{ChainConfig, LedgerConfig, LedgerSnapshot, PharmaChain};

/// Exit code when `verify` finds a known batch whose history fails replay or
/// signature checks. Lookup and load errors exit with 1.
pub const EXIT_INTEGRITY_FAILURE: u8 = 2;

/// Where the ledger comes from.
#[derive(Debug, Clone, Default)]
pub struct ChainSource {
    /// YAML configuration; supplies the snapshot path and ledger policy.
    pub config: Option<PathBuf>,
    /// Snapshot file; overrides the configured path.
    pub snapshot: Option<PathBuf>,
}

impl ChainSource {
    /// Load the configuration (if any), then read and restore the snapshot.
    pub fn open(&self) -> Result<PharmaChain> {
        let config = self
            .config
            .as_deref()
            .map(|path| {
                ChainConfig::load(path)
                    .with_context(|| format!("loading config {}", path.display()))
            })
            .transpose()?;

        let snapshot_path = self
            .snapshot
            .clone()
            .or_else(|| config.as_ref().and_then(|c| c.snapshot_path.clone()))
            .context("no snapshot given: pass --snapshot or set snapshot_path in --config")?;
        let ledger_config = config.as_ref().map(|c| c.ledger).unwrap_or_default();

        let snapshot = LedgerSnapshot::load(&snapshot_path)
            .with_context(|| format!("reading snapshot {}", snapshot_path.display()))?;
        if let Some(cfg) = &config {
            if cfg.authority != snapshot.authority {
                anyhow::bail!(
                    "snapshot authority {} does not match configured authority {}",
                    snapshot.authority,
                    cfg.authority
                );
            }
        }
        restore(snapshot, ledger_config, &snapshot_path)
    }
}

fn restore(snapshot: LedgerSnapshot, config: LedgerConfig, path: &Path) -> Result<PharmaChain> {
    let chain = snapshot
        .restore(config)
        .with_context(|| format!("snapshot {} failed verification", path.display()))?;
    tracing::info!(
        path = %path.display(),
        batches = chain.ledger().len(),
        "snapshot loaded"
    );
    Ok(chain)
}

/// Print `value` as pretty JSON.
pub fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    writeln!(out, "{json}")?;
    Ok(())
}

/// First eight hex characters of an identifier, for tables.
pub fn short(actor: &pharma_core::ActorId) -> String {
    pharma_core::hex::prefix(actor.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_without_snapshot_is_an_error() {
        let err = ChainSource::default().open().unwrap_err();
        assert!(err.to_string().contains("no snapshot given"));
    }

    #[test]
    fn open_missing_file_names_the_path() {
        let source = ChainSource {
            config: None,
            snapshot: Some(PathBuf::from("/nonexistent/ledger.json")),
        };
        let err = source.open().unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/ledger.json"));
    }

    #[test]
    fn short_id_is_eight_chars() {
        let id = pharma_core::ActorId::from_bytes([0xab; 32]);
        assert_eq!(short(&id), "abababab");
    }
}
