use tally_types::{AccountId, ReferenceNumber, TransactionId};

/// The three monotonic sequences a ledger hands out.
///
/// Each field holds the next value to issue. Transaction ids are consumed
/// even when the operation that drew them later fails; an account id only
/// once its account is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counters {
    next_account: AccountId,
    next_transaction: TransactionId,
    next_reference: ReferenceNumber,
}

impl Counters {
    /// Counters for an empty ledger.
    pub fn fresh() -> Self {
        Self {
            next_account: AccountId::FIRST,
            next_transaction: TransactionId::FIRST,
            next_reference: ReferenceNumber::FIRST,
        }
    }

    /// Resume after the highest values already present in the logs.
    pub fn resume(
        last_account: Option<AccountId>,
        last_transaction: Option<TransactionId>,
        last_reference: Option<ReferenceNumber>,
    ) -> Self {
        Self {
            next_account: last_account.map_or(AccountId::FIRST, AccountId::successor),
            next_transaction: last_transaction.map_or(TransactionId::FIRST, TransactionId::successor),
            next_reference: last_reference.map_or(ReferenceNumber::FIRST, ReferenceNumber::successor),
        }
    }

    pub fn next_account_id(&self) -> AccountId {
        self.next_account
    }

    pub fn next_transaction_id(&self) -> TransactionId {
        self.next_transaction
    }

    pub fn next_reference_number(&self) -> ReferenceNumber {
        self.next_reference
    }

    pub(crate) fn allocate_account(&mut self) -> AccountId {
        let id = self.next_account;
        self.next_account = id.successor();
        id
    }

    pub(crate) fn allocate_transaction(&mut self) -> TransactionId {
        let id = self.next_transaction;
        self.next_transaction = id.successor();
        id
    }

    pub(crate) fn allocate_reference(&mut self) -> ReferenceNumber {
        let reference = self.next_reference;
        self.next_reference = reference.successor();
        reference
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::fresh()
    }
}
