use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tally_gate::{CommitGate, PendingTransaction, ValidityCheck, Verdict};
use tally_store::{RowLog, TailReader};
use tally_types::{
    schema, temporal, AccountId, Decimal, ReferenceNumber, RegistryEntry, TransactionId,
    TransactionRecord, TransactionStatus, TransactionType,
};
use tracing::{info, warn};

use crate::account::Account;
use crate::audit::{audit_transfer_legs, TransferAudit};
use crate::codec::{LogRow, RegistryRow};
use crate::config::LedgerConfig;
use crate::counters::Counters;
use crate::error::{LedgerError, LedgerResult};
use crate::history::TransactionHistory;
use crate::lifecycle::LedgerPhase;
use crate::recovery;
use crate::summary::{total_of, LedgerSummary};

/// The two rows written by a successful transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    /// `transfer_to` row on the source account.
    pub debit: TransactionRecord,
    /// `receive_from` row on the target account.
    pub credit: TransactionRecord,
}

impl TransferRecord {
    pub fn reference_number(&self) -> Option<ReferenceNumber> {
        self.debit.reference_number
    }
}

/// Ledger engine over a directory of append-only logs.
///
/// All state lives behind one mutex, so every operation sees and leaves a
/// consistent view. A row is appended before the in-memory balance it
/// describes changes; balances in memory never run ahead of the logs.
///
/// # Example
///
/// ```no_run
/// use tally_gate::GateConfig;
/// use tally_ledger::{Ledger, LedgerConfig};
/// use tally_types::Decimal;
///
/// let config = LedgerConfig::in_dir("./data").with_gate(GateConfig::immediate());
/// let ledger = Ledger::open(config)?;
/// ledger.create_account("Ben", Decimal::new(1000, 0), None)?;
/// ledger.deposit("Ben", Decimal::new(500, 0))?;
/// assert_eq!(ledger.get_account("Ben")?.current_balance(), Decimal::new(1500, 0));
/// ledger.shutdown()?;
/// # Ok::<(), tally_ledger::LedgerError>(())
/// ```
pub struct Ledger {
    config: LedgerConfig,
    gate: CommitGate,
    state: Mutex<LedgerState>,
}

struct LedgerState {
    phase: LedgerPhase,
    accounts: BTreeMap<String, Account>,
    counters: Counters,
    system_log: RowLog,
    registry: RowLog,
}

impl LedgerState {
    fn account(&self, display_name: &str) -> LedgerResult<&Account> {
        self.accounts
            .get(display_name)
            .ok_or_else(|| LedgerError::AccountNotFound(display_name.to_string()))
    }

    fn commit(&mut self, account: Account) {
        self.accounts
            .insert(account.display_name().to_string(), account);
    }

    /// Append a leg to the system log and then to its account's private log.
    ///
    /// A row with no account id has no private log.
    fn append(&mut self, config: &LedgerConfig, record: &TransactionRecord) -> LedgerResult<()> {
        let row = LogRow::from(record);
        self.system_log.append(&row)?;
        let Some(account_id) = record.account_id else {
            return Ok(());
        };
        let mut private = RowLog::new(
            config.account_log_path(account_id),
            &schema::TRANSACTION_COLUMNS,
            config.sync_mode,
        );
        private.append(&row)?;
        private.close()?;
        Ok(())
    }

    fn close(&mut self) -> LedgerResult<()> {
        self.system_log.close()?;
        self.registry.close()?;
        Ok(())
    }
}

impl Ledger {
    /// Open the ledger in `config.data_dir`, recovering any existing state.
    pub fn open(config: LedgerConfig) -> LedgerResult<Self> {
        let gate = CommitGate::with_default_checks(config.gate.clone());
        Self::open_with_gate(config, gate)
    }

    /// Open with a caller-assembled commit gate.
    pub fn open_with_gate(config: LedgerConfig, gate: CommitGate) -> LedgerResult<Self> {
        let mut phase = LedgerPhase::Uninitialized;
        phase.advance(LedgerPhase::Recovering)?;
        info!(data_dir = %config.data_dir.display(), checks = gate.check_count(), "opening ledger");

        let recovered = recovery::recover(&config, &TailReader::new())?;

        if config.audit_transfers_on_recovery {
            let audit = audit_transfer_legs(&config.transactions_path())?;
            for leg in &audit.unmatched {
                warn!(
                    transaction_id = %leg.transaction_id,
                    account_id = ?leg.account_id,
                    reason = %leg.reason,
                    "unmatched transfer leg"
                );
            }
        }

        let system_log = RowLog::new(
            config.transactions_path(),
            &schema::TRANSACTION_COLUMNS,
            config.sync_mode,
        );
        let registry = RowLog::new(
            config.accounts_path(),
            &schema::REGISTRY_COLUMNS,
            config.sync_mode,
        );

        phase.advance(LedgerPhase::Ready)?;
        Ok(Self {
            config,
            gate,
            state: Mutex::new(LedgerState {
                phase,
                accounts: recovered.accounts,
                counters: recovered.counters,
                system_log,
                registry,
            }),
        })
    }

    /// Append a validity check to the commit gate.
    pub fn add_check(&mut self, check: Box<dyn ValidityCheck>) {
        self.gate.add_check(check);
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn phase(&self) -> LedgerResult<LedgerPhase> {
        Ok(self.lock()?.phase)
    }

    /// Snapshot of the next values each counter will issue.
    pub fn counters(&self) -> LedgerResult<Counters> {
        Ok(self.lock_ready()?.counters)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create an account. `currency` defaults to the configured currency.
    ///
    /// A display name that already exists is refused with
    /// [`LedgerError::DuplicateAccount`] and nothing is written.
    pub fn create_account(
        &self,
        display_name: &str,
        opening_balance: Decimal,
        currency: Option<&str>,
    ) -> LedgerResult<TransactionRecord> {
        let currency = currency.unwrap_or(self.config.default_currency.as_str());
        validate_label("display name", display_name)?;
        validate_label("currency", currency)?;
        if opening_balance < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(opening_balance));
        }

        let mut state = self.lock_ready()?;
        if state.accounts.contains_key(display_name) {
            warn!(display_name, "account already exists; creation skipped");
            return Err(LedgerError::DuplicateAccount(display_name.to_string()));
        }

        // Drawn only once the gate passes, so a rejected create leaves no gap.
        let account_id = state.counters.next_account_id();
        let pending = PendingTransaction::new(
            TransactionType::CreateAccount,
            account_id,
            display_name,
            opening_balance,
            currency,
            Decimal::ZERO,
        );
        let transaction_id = self.pass_gate(&mut state, &pending)?;
        state.counters.allocate_account();

        let reference = state.counters.allocate_reference();
        let record = completed_record(&pending, transaction_id, reference, opening_balance);
        state.append(&self.config, &record)?;
        let entry = RegistryEntry {
            account_id,
            display_name: display_name.to_string(),
            created_at: record.completed_at,
        };
        state.registry.append(&RegistryRow::from(&entry))?;
        state.commit(Account::new(account_id, display_name, opening_balance, currency));

        info!(
            account_id = %account_id,
            display_name,
            balance = %opening_balance,
            currency,
            "account created"
        );
        Ok(record)
    }

    /// Credit `amount` to an account.
    pub fn deposit(&self, display_name: &str, amount: Decimal) -> LedgerResult<TransactionRecord> {
        let mut state = self.lock_ready()?;
        let account = state.account(display_name)?.clone();
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.post(&mut state, account, TransactionType::Deposit, amount)
    }

    /// Debit `amount` from an account.
    pub fn withdraw(&self, display_name: &str, amount: Decimal) -> LedgerResult<TransactionRecord> {
        let mut state = self.lock_ready()?;
        let account = state.account(display_name)?.clone();
        ensure_funds(&account, amount)?;
        self.post(&mut state, account, TransactionType::Withdraw, amount)
    }

    /// Move `amount` from `source` to `target`.
    ///
    /// Writes the source's `transfer_to` row, then the target's
    /// `receive_from` row. Both carry the same reference number and distinct
    /// transaction ids. There is no multi-row commit: a crash between the two
    /// appends leaves a debit without a credit, which
    /// [`Ledger::audit_transfers`] reports.
    pub fn transfer(
        &self,
        source_name: &str,
        target_name: &str,
        amount: Decimal,
    ) -> LedgerResult<TransferRecord> {
        let mut state = self.lock_ready()?;
        let mut source = state.account(source_name)?.clone();
        let mut target = state.account(target_name)?.clone();
        if source.id() == target.id() {
            return Err(LedgerError::SelfTransfer(source_name.to_string()));
        }
        if source.currency() != target.currency() {
            return Err(LedgerError::CurrencyMismatch {
                from_currency: source.currency().to_string(),
                to_currency: target.currency().to_string(),
            });
        }
        ensure_funds(&source, amount)?;

        let pending = PendingTransaction::new(
            TransactionType::TransferTo,
            source.id(),
            source.display_name(),
            amount,
            source.currency(),
            source.current_balance(),
        )
        .with_counterparty(target.as_counterparty());
        let target_before = target.current_balance();
        // Both balances are settled on copies before anything is logged.
        let source_balance = source.apply_delta(-amount)?;
        let target_balance = target.apply_delta(amount)?;

        let debit_id = self.pass_gate(&mut state, &pending)?;
        let reference = state.counters.allocate_reference();

        let source_party = source.as_counterparty();
        let debit = completed_record(&pending, debit_id, reference, source_balance);
        state.append(&self.config, &debit)?;
        state.commit(source);

        let credit_id = state.counters.allocate_transaction();
        let credit_pending = PendingTransaction {
            kind: TransactionType::ReceiveFrom,
            account_id: target.id(),
            display_name: target.display_name().to_string(),
            amount,
            currency: target.currency().to_string(),
            balance_before: target_before,
            counterparty: Some(source_party),
            started_at: pending.started_at,
        };
        let credit = completed_record(&credit_pending, credit_id, reference, target_balance);
        state.append(&self.config, &credit)?;
        state.commit(target);

        info!(
            reference_number = %reference,
            source = source_name,
            target = target_name,
            amount = %amount,
            "transfer completed"
        );
        Ok(TransferRecord { debit, credit })
    }

    /// Gate, apply, and log a single-leg deposit or withdrawal.
    fn post(
        &self,
        state: &mut LedgerState,
        mut account: Account,
        kind: TransactionType,
        amount: Decimal,
    ) -> LedgerResult<TransactionRecord> {
        let pending = PendingTransaction::new(
            kind,
            account.id(),
            account.display_name(),
            amount,
            account.currency(),
            account.current_balance(),
        );
        let balance = account.apply_delta(kind.sign() * amount)?;
        let transaction_id = self.pass_gate(state, &pending)?;

        let reference = state.counters.allocate_reference();
        let record = completed_record(&pending, transaction_id, reference, balance);
        state.append(&self.config, &record)?;
        state.commit(account);

        info!(
            transaction_id = %transaction_id,
            kind = %kind,
            display_name = %record.display_name,
            amount = %amount,
            balance = %balance,
            "transaction completed"
        );
        Ok(record)
    }

    /// Run the commit gate and allocate the leg's transaction id.
    ///
    /// On rejection the failed row is logged and [`LedgerError::CheckFailed`]
    /// returned; no balance has changed at that point.
    fn pass_gate(
        &self,
        state: &mut LedgerState,
        pending: &PendingTransaction,
    ) -> LedgerResult<TransactionId> {
        let verdict = self.gate.evaluate(pending)?;
        let transaction_id = state.counters.allocate_transaction();

        let Verdict::Rejected { reason } = verdict.verdict else {
            return Ok(transaction_id);
        };

        // A failed create carries no account id and lands only in the system log.
        let record = failed_record(pending, transaction_id, &reason);
        state.append(&self.config, &record)?;
        warn!(
            transaction_id = %transaction_id,
            kind = %pending.kind,
            display_name = %pending.display_name,
            reason = %reason,
            "transaction failed validity check"
        );
        Err(LedgerError::CheckFailed {
            transaction_id,
            reason,
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get_account(&self, display_name: &str) -> LedgerResult<Account> {
        Ok(self.lock_ready()?.account(display_name)?.clone())
    }

    /// All accounts in ascending id order.
    pub fn accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.lock_ready()?.accounts.values().cloned().collect();
        accounts.sort_by_key(Account::id);
        Ok(accounts)
    }

    /// Rows of one account's private log, oldest first.
    ///
    /// The file is opened under the ledger lock and streamed after it is
    /// released. Calling again restarts from the first row.
    pub fn list_transactions(&self, account_id: AccountId) -> LedgerResult<TransactionHistory> {
        let _state = self.lock_ready()?;
        TransactionHistory::open(&self.config.account_log_path(account_id))
    }

    /// [`Ledger::list_transactions`] by display name.
    pub fn history(&self, display_name: &str) -> LedgerResult<TransactionHistory> {
        let state = self.lock_ready()?;
        let account_id = state.account(display_name)?.id();
        TransactionHistory::open(&self.config.account_log_path(account_id))
    }

    /// Every row of the system log, oldest first.
    pub fn system_transactions(&self) -> LedgerResult<TransactionHistory> {
        let _state = self.lock_ready()?;
        TransactionHistory::open(&self.config.transactions_path())
    }

    pub fn total_accounts(&self) -> LedgerResult<usize> {
        Ok(self.lock_ready()?.accounts.len())
    }

    /// Sum of every loaded balance. Currencies are not converted.
    pub fn total_balance(&self) -> LedgerResult<Decimal> {
        total_of(self.lock_ready()?.accounts.values())
    }

    /// Mean balance, or zero when there are no accounts.
    pub fn average_balance(&self) -> LedgerResult<Decimal> {
        let state = self.lock_ready()?;
        if state.accounts.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let total = total_of(state.accounts.values())?;
        Ok(total / Decimal::from(state.accounts.len()))
    }

    pub fn summary(&self) -> LedgerResult<LedgerSummary> {
        let state = self.lock_ready()?;
        LedgerSummary::from_accounts(
            state.accounts.values().cloned().collect(),
            self.config.default_currency.clone(),
        )
    }

    /// Pair the transfer legs of the system log. Detection only.
    pub fn audit_transfers(&self) -> LedgerResult<TransferAudit> {
        let _state = self.lock_ready()?;
        audit_transfer_legs(&self.config.transactions_path())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Flush and close the log handles. Closing twice is a no-op.
    pub fn shutdown(&self) -> LedgerResult<()> {
        let mut state = self.lock()?;
        match state.phase {
            LedgerPhase::Closed => return Ok(()),
            LedgerPhase::Ready => {}
            other => return Err(LedgerError::NotReady(other)),
        }
        state.phase.advance(LedgerPhase::ShuttingDown)?;
        let closed = state.close();
        state.phase.advance(LedgerPhase::Closed)?;
        closed?;
        info!(data_dir = %self.config.data_dir.display(), "ledger closed");
        Ok(())
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, LedgerState>> {
        self.state.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    fn lock_ready(&self) -> LedgerResult<MutexGuard<'_, LedgerState>> {
        let state = self.lock()?;
        state.phase.ensure_ready()?;
        Ok(state)
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "ledger did not shut down cleanly");
        }
    }
}

fn ensure_funds(account: &Account, amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO || amount > account.current_balance() {
        return Err(LedgerError::InsufficientFunds {
            account: account.display_name().to_string(),
            requested: amount,
            available: account.current_balance(),
        });
    }
    Ok(())
}

/// Names and currencies end up in single-line log rows.
fn validate_label(field: &'static str, value: &str) -> LedgerResult<()> {
    if value.trim().is_empty() || value.contains(|c| c == '\n' || c == '\r') {
        return Err(LedgerError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn completed_record(
    pending: &PendingTransaction,
    transaction_id: TransactionId,
    reference: ReferenceNumber,
    resulting_balance: Decimal,
) -> TransactionRecord {
    TransactionRecord {
        transaction_id,
        started_at: pending.started_at,
        account_id: Some(pending.account_id),
        display_name: pending.display_name.clone(),
        kind: pending.kind,
        amount: pending.amount,
        currency: pending.currency.clone(),
        resulting_balance,
        counterparty: pending.counterparty.clone(),
        reference_number: Some(reference),
        completed_at: temporal::now(),
        status: TransactionStatus::Completed,
        remarks: None,
    }
}

fn failed_record(
    pending: &PendingTransaction,
    transaction_id: TransactionId,
    reason: &str,
) -> TransactionRecord {
    TransactionRecord {
        transaction_id,
        started_at: pending.started_at,
        account_id: (pending.kind != TransactionType::CreateAccount).then_some(pending.account_id),
        display_name: pending.display_name.clone(),
        kind: pending.kind,
        amount: pending.amount,
        currency: pending.currency.clone(),
        resulting_balance: pending.balance_before,
        counterparty: pending.counterparty.clone(),
        reference_number: None,
        completed_at: temporal::now(),
        status: TransactionStatus::Failed,
        remarks: Some(reason.replace(&['\r', '\n'][..], " ")),
    }
}
