use std::fmt;

use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};

/// Lifecycle of a ledger instance.
///
/// `Uninitialized -> Recovering -> Ready -> ShuttingDown -> Closed`.
/// Operations are accepted only in `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPhase {
    Uninitialized,
    Recovering,
    Ready,
    ShuttingDown,
    Closed,
}

impl LedgerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Recovering => "recovering",
            Self::Ready => "ready",
            Self::ShuttingDown => "shutting_down",
            Self::Closed => "closed",
        }
    }

    /// The phase that legally follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Uninitialized => Some(Self::Recovering),
            Self::Recovering => Some(Self::Ready),
            Self::Ready => Some(Self::ShuttingDown),
            Self::ShuttingDown => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Move to `to`, which must be the immediate successor.
    pub fn advance(&mut self, to: Self) -> LedgerResult<()> {
        if self.next() != Some(to) {
            return Err(LedgerError::InvalidTransition { from: *self, to });
        }
        tracing::debug!(from = %self, to = %to, "ledger phase transition");
        *self = to;
        Ok(())
    }

    pub fn ensure_ready(self) -> LedgerResult<()> {
        match self {
            Self::Ready => Ok(()),
            other => Err(LedgerError::NotReady(other)),
        }
    }
}

impl fmt::Display for LedgerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let mut phase = LedgerPhase::Uninitialized;
        for to in [
            LedgerPhase::Recovering,
            LedgerPhase::Ready,
            LedgerPhase::ShuttingDown,
            LedgerPhase::Closed,
        ] {
            phase.advance(to).unwrap();
        }
        assert_eq!(phase, LedgerPhase::Closed);
        assert_eq!(phase.next(), None);
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut phase = LedgerPhase::Uninitialized;
        let err = phase.advance(LedgerPhase::Ready).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidTransition {
                from: LedgerPhase::Uninitialized,
                to: LedgerPhase::Ready
            }
        ));
        assert_eq!(phase, LedgerPhase::Uninitialized);
    }

    #[test]
    fn only_ready_accepts_operations() {
        assert!(LedgerPhase::Ready.ensure_ready().is_ok());
        assert!(matches!(
            LedgerPhase::Closed.ensure_ready(),
            Err(LedgerError::NotReady(LedgerPhase::Closed))
        ));
    }
}
