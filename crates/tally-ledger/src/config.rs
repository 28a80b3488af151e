use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_gate::GateConfig;
use tally_store::SyncMode;
use tally_types::AccountId;

use crate::error::{LedgerError, LedgerResult};

/// File layout and behaviour of a ledger instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding every log file.
    pub data_dir: PathBuf,
    /// Account registry file name.
    pub accounts_file: String,
    /// System-wide transaction log file name.
    pub transactions_file: String,
    /// Per-account log name is `{account_id}{account_file_suffix}`.
    pub account_file_suffix: String,
    /// Currency used when an account is created without one.
    pub default_currency: String,
    pub sync_mode: SyncMode,
    /// Scan the system log for half-written transfers during recovery.
    pub audit_transfers_on_recovery: bool,
    pub gate: GateConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            accounts_file: "system_accounts.csv".into(),
            transactions_file: "system_transactions.csv".into(),
            account_file_suffix: "_transactions.csv".into(),
            default_currency: "HKD".into(),
            sync_mode: SyncMode::default(),
            audit_transfers_on_recovery: false,
            gate: GateConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Default layout rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    /// Load a TOML configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(&self.accounts_file)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.data_dir.join(&self.transactions_file)
    }

    pub fn account_log_path(&self, account_id: AccountId) -> PathBuf {
        self.data_dir
            .join(format!("{account_id}{}", self.account_file_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_historic_file_names() {
        let config = LedgerConfig::in_dir("/var/tally");
        assert_eq!(config.accounts_path(), Path::new("/var/tally/system_accounts.csv"));
        assert_eq!(
            config.transactions_path(),
            Path::new("/var/tally/system_transactions.csv")
        );
        assert_eq!(
            config.account_log_path(AccountId::new(3)),
            Path::new("/var/tally/3_transactions.csv")
        );
        assert_eq!(config.default_currency, "HKD");
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(
            &path,
            r#"
data_dir = "/srv/ledger"
default_currency = "USD"
sync_mode = "every_write"

[gate]
check_latency_ms = 0
"#,
        )
        .unwrap();

        let config = LedgerConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/ledger"));
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.sync_mode, SyncMode::EveryWrite);
        assert_eq!(config.gate.check_latency_ms, 0);
        assert_eq!(config.accounts_file, "system_accounts.csv");
    }

    #[test]
    fn load_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(&path, "sync_mode = 7").unwrap();
        assert!(matches!(LedgerConfig::load(&path), Err(LedgerError::Config(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LedgerConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
