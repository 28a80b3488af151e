use crate::check::{CheckDecision, PendingTransaction, ValidityCheck};
use crate::error::GateError;

type CheckFn = dyn Fn(&PendingTransaction) -> Result<CheckDecision, GateError> + Send + Sync;

/// A check backed by a closure, for embedding callers that need a rule
/// without defining a type.
pub struct FnCheck {
    name: String,
    check: Box<CheckFn>,
}

impl FnCheck {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&PendingTransaction) -> Result<CheckDecision, GateError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }
}

impl ValidityCheck for FnCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, pending: &PendingTransaction) -> Result<CheckDecision, GateError> {
        (self.check)(pending)
    }
}
