//! # Chain Configuration
//!
//! [`ChainConfig`] is read from YAML:
//!
//! ```yaml
//! authority: 5f0c...e1        # hex Ed25519 public key of the bootstrap authority
//! snapshot_path: ./ledger.json
//! ledger:
//!   max_metadata_len: 1024
//!   require_signatures: true
//! ```
//!
//! Only `authority` is required.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pharma_core::ActorId;

use crate::error::LedgerError;

/// Default upper bound on record metadata, in bytes.
pub const DEFAULT_MAX_METADATA_LEN: usize = 1024;

/// Top-level configuration for a [`PharmaChain`](crate::PharmaChain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// The deploying authority allowed to make the first registry entry.
    pub authority: ActorId,
    /// Where the ledger snapshot is persisted, if anywhere.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Ledger limits and submission policy.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Limits and policy applied on the submission path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Longest accepted metadata string, in bytes.
    pub max_metadata_len: usize,
    /// Reject requests that arrive without a signature.
    pub require_signatures: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_metadata_len: DEFAULT_MAX_METADATA_LEN,
            require_signatures: true,
        }
    }
}

impl ChainConfig {
    /// Configuration with default ledger policy and no snapshot path.
    pub fn new(authority: ActorId) -> Self {
        Self {
            authority,
            snapshot_path: None,
            ledger: LedgerConfig::default(),
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LedgerError> {
        serde_yaml::from_str(yaml).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority_hex() -> String {
        "a1".repeat(32)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = ChainConfig::from_yaml_str(&format!("authority: {}\n", authority_hex())).unwrap();
        assert_eq!(cfg.authority, ActorId::from_bytes([0xa1; 32]));
        assert_eq!(cfg.snapshot_path, None);
        assert_eq!(cfg.ledger.max_metadata_len, DEFAULT_MAX_METADATA_LEN);
        assert!(cfg.ledger.require_signatures);
    }

    #[test]
    fn test_full_config() {
        let yaml = format!(
            "authority: {}\nsnapshot_path: /var/lib/pharmachain/ledger.json\nledger:\n  max_metadata_len: 64\n  require_signatures: false\n",
            authority_hex()
        );
        let cfg = ChainConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(
            cfg.snapshot_path.as_deref(),
            Some(Path::new("/var/lib/pharmachain/ledger.json"))
        );
        assert_eq!(cfg.ledger.max_metadata_len, 64);
        assert!(!cfg.ledger.require_signatures);
    }

    #[test]
    fn test_partial_ledger_section_keeps_other_defaults() {
        let yaml = format!("authority: {}\nledger:\n  max_metadata_len: 10\n", authority_hex());
        let cfg = ChainConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(cfg.ledger.max_metadata_len, 10);
        assert!(cfg.ledger.require_signatures);
    }

    #[test]
    fn test_missing_authority_rejected() {
        assert!(matches!(
            ChainConfig::from_yaml_str("snapshot_path: x.json\n"),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_bad_authority_rejected() {
        assert!(ChainConfig::from_yaml_str("authority: not-hex\n").is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = format!("authority: {}\nport: 8080\n", authority_hex());
        assert!(ChainConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.yaml");
        std::fs::write(&path, format!("authority: {}\n", authority_hex())).unwrap();
        let cfg = ChainConfig::load(&path).unwrap();
        assert_eq!(cfg, ChainConfig::new(ActorId::from_bytes([0xa1; 32])));
        assert!(ChainConfig::load(&dir.path().join("missing.yaml")).is_err());
    }
}
