//! Rebuilding in-memory state from the logs on startup.
//!
//! The registry lists which accounts exist. Each account's balance and
//! currency come from the last row of its private log, and the transaction
//! and reference counters resume after the last row of the system log.
//! Only tails are read, so startup cost does not grow with history length.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tally_store::{read_rows, LastRecord, StoreError, TailReader};
use tally_types::{schema, AccountId, Decimal, ReferenceNumber, TransactionId};
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::codec::{parse_decimal, RegistryRow};
use crate::config::LedgerConfig;
use crate::counters::Counters;
use crate::error::{LedgerError, LedgerResult};

/// State reconstructed from disk.
#[derive(Debug)]
pub(crate) struct Recovered {
    pub accounts: BTreeMap<String, Account>,
    pub counters: Counters,
}

pub(crate) fn recover(config: &LedgerConfig, tail: &TailReader) -> LedgerResult<Recovered> {
    let (accounts, last_account) = load_registry(config, tail)?;
    let (last_transaction, last_reference) = resume_system_counters(&config.transactions_path(), tail)?;
    let counters = Counters::resume(last_account, last_transaction, last_reference);

    info!(
        accounts = accounts.len(),
        next_account_id = %counters.next_account_id(),
        next_transaction_id = %counters.next_transaction_id(),
        next_reference_number = %counters.next_reference_number(),
        "ledger state recovered"
    );

    Ok(Recovered { accounts, counters })
}

/// Load every registered account and return the highest account id seen,
/// duplicates included.
fn load_registry(
    config: &LedgerConfig,
    tail: &TailReader,
) -> LedgerResult<(BTreeMap<String, Account>, Option<AccountId>)> {
    let path = config.accounts_path();
    let rows = match read_rows::<RegistryRow>(&path) {
        Ok(rows) => rows,
        Err(StoreError::NotFound(_)) => {
            info!(path = %path.display(), "no account registry; starting a fresh ledger");
            return Ok((BTreeMap::new(), None));
        }
        Err(e) => return Err(e.into()),
    };

    let mut accounts = BTreeMap::new();
    let mut last_account: Option<AccountId> = None;

    for row in rows {
        let row = row.map_err(|e| corrupt_log(&path, e))?;
        last_account = last_account.max(Some(row.account_id));

        if accounts.contains_key(&row.display_name) {
            warn!(
                account_id = %row.account_id,
                display_name = %row.display_name,
                "duplicate display name in registry; keeping the first account"
            );
            continue;
        }

        let account = load_account(config, tail, row.account_id, &row.display_name)?;
        debug!(
            account_id = %account.id(),
            balance = %account.current_balance(),
            "account restored"
        );
        accounts.insert(row.display_name, account);
    }

    Ok((accounts, last_account))
}

/// Materialize one account from the last row of its private log.
fn load_account(
    config: &LedgerConfig,
    tail: &TailReader,
    account_id: AccountId,
    display_name: &str,
) -> LedgerResult<Account> {
    let corrupt = |reason: String| LedgerError::CorruptLedger {
        account: format!("{account_id} ({display_name})"),
        reason,
    };

    let path = config.account_log_path(account_id);
    let last = tail
        .extract_last_record(
            &path,
            &[schema::ACCOUNT_ID, schema::CURRENCY, schema::RESULTING_BALANCE],
        )
        .map_err(|e| corrupt(e.to_string()))?;

    let logged_id = field(&last, schema::ACCOUNT_ID)
        .parse::<AccountId>()
        .map_err(|e| corrupt(e.to_string()))?;
    if logged_id != account_id {
        return Err(corrupt(format!(
            "last row of {} belongs to account {logged_id}",
            path.display()
        )));
    }

    let balance = parse_decimal(field(&last, schema::RESULTING_BALANCE))
        .map_err(|e| corrupt(e.to_string()))?;
    if balance < Decimal::ZERO {
        return Err(corrupt(format!("negative resulting balance {balance}")));
    }

    let currency = field(&last, schema::CURRENCY).trim();
    if currency.is_empty() {
        return Err(corrupt("last row has no currency".to_string()));
    }

    Ok(Account::new(account_id, display_name, balance, currency))
}

/// The last transaction id and the highest reference number in the system log.
fn resume_system_counters(
    path: &Path,
    tail: &TailReader,
) -> LedgerResult<(Option<TransactionId>, Option<ReferenceNumber>)> {
    let last = match tail.extract_last_record(path, &[schema::TRANSACTION_ID, schema::REFERENCE_NUMBER]) {
        Ok(last) => last,
        Err(StoreError::NotFound(_) | StoreError::EmptyFile(_) | StoreError::NoDataRows(_)) => {
            info!(path = %path.display(), "system log has no rows; transaction counters start at 1");
            return Ok((None, None));
        }
        Err(e) => return Err(corrupt_log(path, e)),
    };

    let transaction_id = field(&last, schema::TRANSACTION_ID)
        .parse::<TransactionId>()
        .map_err(|e| corrupt_log(path, e))?;

    let reference = match field(&last, schema::REFERENCE_NUMBER).trim() {
        // Failed rows carry no reference number.
        "" => max_reference_number(path)?,
        text => Some(
            text.parse::<ReferenceNumber>()
                .map_err(|e| corrupt_log(path, e))?,
        ),
    };

    Ok((Some(transaction_id), reference))
}

#[derive(Deserialize)]
struct ReferenceColumn {
    reference_number: Option<ReferenceNumber>,
}

fn max_reference_number(path: &Path) -> LedgerResult<Option<ReferenceNumber>> {
    debug!(path = %path.display(), "last row has no reference number; scanning the full log");
    let mut highest = None;
    for row in read_rows::<ReferenceColumn>(path)? {
        let row = row.map_err(|e| corrupt_log(path, e))?;
        highest = highest.max(row.reference_number);
    }
    Ok(highest)
}

fn field<'a>(record: &'a LastRecord, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or_default()
}

fn corrupt_log(path: &Path, error: impl std::fmt::Display) -> LedgerError {
    LedgerError::CorruptLog {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tally_gate::GateConfig;

    use crate::engine::Ledger;

    const HEADER: &str = "transaction_id,started_at,account_id,display_name,type,amount,currency,\
resulting_balance,counterparty_account_id,counterparty_display_name,reference_number,\
completed_at,status,remarks";
    const TS: &str = "2024-05-01T09:30:00.000000Z";

    fn row(tx: u64, account: u64, name: &str, kind: &str, balance: &str, reference: &str) -> String {
        format!("{tx},{TS},{account},{name},{kind},1,HKD,{balance},,,{reference},{TS},completed,")
    }

    fn write_log(path: &Path, rows: &[String]) {
        let mut text = format!("{HEADER}\n");
        for r in rows {
            text.push_str(r);
            text.push('\n');
        }
        fs::write(path, text).unwrap();
    }

    fn config(dir: &Path) -> LedgerConfig {
        LedgerConfig::in_dir(dir).with_gate(GateConfig::immediate())
    }

    #[test]
    fn missing_registry_is_a_fresh_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let recovered = recover(&config(dir.path()), &TailReader::new()).unwrap();
        assert!(recovered.accounts.is_empty());
        assert_eq!(recovered.counters, Counters::fresh());
    }

    #[test]
    fn duplicate_registry_names_keep_first_but_count_toward_ids() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("system_accounts.csv"),
            format!("account_id,display_name,created_at\n1,Ben,{TS}\n5,Ben,{TS}\n2,Ricky,{TS}\n"),
        )
        .unwrap();
        write_log(&dir.path().join("1_transactions.csv"), &[row(1, 1, "Ben", "create_account", "10", "1")]);
        write_log(&dir.path().join("2_transactions.csv"), &[row(2, 2, "Ricky", "create_account", "20.5", "2")]);
        write_log(
            &dir.path().join("system_transactions.csv"),
            &[
                row(1, 1, "Ben", "create_account", "10", "1"),
                row(2, 2, "Ricky", "create_account", "20.5", "2"),
            ],
        );

        let recovered = recover(&config(dir.path()), &TailReader::new()).unwrap();
        assert_eq!(recovered.accounts.len(), 2);
        assert_eq!(recovered.accounts["Ben"].id(), AccountId::new(1));
        assert_eq!(recovered.accounts["Ricky"].current_balance(), Decimal::new(205, 1));
        assert_eq!(recovered.counters.next_account_id(), AccountId::new(6));
        assert_eq!(recovered.counters.next_transaction_id(), TransactionId::new(3));
        assert_eq!(recovered.counters.next_reference_number(), ReferenceNumber::new(3));
    }

    #[test]
    fn missing_private_log_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("system_accounts.csv"),
            format!("account_id,display_name,created_at\n1,Ben,{TS}\n"),
        )
        .unwrap();

        let err = Ledger::open(config(dir.path())).err().unwrap();
        match err {
            LedgerError::CorruptLedger { account, reason } => {
                assert_eq!(account, "1 (Ben)");
                assert!(reason.contains("1_transactions.csv"));
            }
            other => panic!("expected CorruptLedger, got {other:?}"),
        }
    }

    #[test]
    fn private_log_of_another_account_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("system_accounts.csv"),
            format!("account_id,display_name,created_at\n1,Ben,{TS}\n"),
        )
        .unwrap();
        write_log(&dir.path().join("1_transactions.csv"), &[row(1, 9, "Ben", "create_account", "10", "1")]);

        let err = recover(&config(dir.path()), &TailReader::new()).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptLedger { .. }));
    }

    #[test]
    fn negative_logged_balance_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("system_accounts.csv"),
            format!("account_id,display_name,created_at\n1,Ben,{TS}\n"),
        )
        .unwrap();
        write_log(&dir.path().join("1_transactions.csv"), &[row(1, 1, "Ben", "create_account", "-3", "1")]);

        let err = recover(&config(dir.path()), &TailReader::new()).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn header_only_system_log_starts_counters_fresh() {
        let dir = tempfile::tempdir().unwrap();
        write_log(&dir.path().join("system_transactions.csv"), &[]);
        let recovered = recover(&config(dir.path()), &TailReader::new()).unwrap();
        assert_eq!(recovered.counters.next_transaction_id(), TransactionId::FIRST);
    }
}
