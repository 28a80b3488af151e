use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tally_types::{AccountId, Decimal, ReferenceNumber, TransactionId, TransactionRecord, TransactionType};

use crate::error::LedgerResult;
use crate::history::TransactionHistory;

/// A completed transfer leg without a well-formed partner.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnmatchedLeg {
    pub reference_number: Option<ReferenceNumber>,
    pub transaction_id: TransactionId,
    pub account_id: Option<AccountId>,
    pub display_name: String,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub reason: String,
}

impl UnmatchedLeg {
    fn new(leg: &TransactionRecord, reason: impl Into<String>) -> Self {
        Self {
            reference_number: leg.reference_number,
            transaction_id: leg.transaction_id,
            account_id: leg.account_id,
            display_name: leg.display_name.clone(),
            kind: leg.kind,
            amount: leg.amount,
            reason: reason.into(),
        }
    }
}

/// Result of pairing the transfer legs of a system log.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TransferAudit {
    /// Completed transfer legs examined.
    pub legs_checked: usize,
    pub unmatched: Vec<UnmatchedLeg>,
}

impl TransferAudit {
    pub fn is_consistent(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Pair every completed `transfer_to` row with its `receive_from` row.
///
/// A process that dies between the two appends of a transfer leaves a debit
/// with no credit. This reports such legs; it never rewrites the log.
pub fn audit_transfer_legs(system_log: &Path) -> LedgerResult<TransferAudit> {
    let mut audit = TransferAudit::default();
    let mut by_reference: BTreeMap<ReferenceNumber, Vec<TransactionRecord>> = BTreeMap::new();

    for record in TransactionHistory::open(system_log)? {
        let record = record?;
        if !record.kind.is_transfer_leg() || !record.is_completed() {
            continue;
        }
        audit.legs_checked += 1;
        match record.reference_number {
            Some(reference) => by_reference.entry(reference).or_default().push(record),
            None => audit
                .unmatched
                .push(UnmatchedLeg::new(&record, "completed transfer leg has no reference number")),
        }
    }

    for legs in by_reference.values() {
        if let Some(reason) = pairing_problem(legs) {
            audit
                .unmatched
                .extend(legs.iter().map(|leg| UnmatchedLeg::new(leg, reason.clone())));
        }
    }

    Ok(audit)
}

fn pairing_problem(legs: &[TransactionRecord]) -> Option<String> {
    let debits: Vec<&TransactionRecord> = legs
        .iter()
        .filter(|l| l.kind == TransactionType::TransferTo)
        .collect();
    let credits: Vec<&TransactionRecord> = legs
        .iter()
        .filter(|l| l.kind == TransactionType::ReceiveFrom)
        .collect();

    match (debits.as_slice(), credits.as_slice()) {
        ([debit], [credit]) => {
            if debit.amount != credit.amount {
                Some(format!(
                    "leg amounts differ: {} sent, {} received",
                    debit.amount, credit.amount
                ))
            } else if debit.counterparty.as_ref().map(|c| c.account_id) != credit.account_id {
                Some("debit names a different receiving account".to_string())
            } else {
                None
            }
        }
        ([_], []) => Some("debit leg has no matching credit".to_string()),
        ([], [_]) => Some("credit leg has no matching debit".to_string()),
        _ => Some(format!(
            "{} debit and {} credit legs share one reference number",
            debits.len(),
            credits.len()
        )),
    }
}
