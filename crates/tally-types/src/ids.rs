use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! sequence_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// The first value a fresh ledger hands out.
            pub const FIRST: Self = Self(1);

            /// Wrap a raw value. Zero is never issued but is accepted here so
            /// that foreign data can be inspected before validation.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            /// The value immediately after this one.
            pub const fn successor(self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| TypeError::InvalidId(s.to_string()))
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

sequence_id!(
    /// Account number, assigned once at creation and never reused.
    AccountId
);

sequence_id!(
    /// System-wide row identifier; strictly increasing across all logs.
    TransactionId
);

sequence_id!(
    /// Links the legs of one logical transaction. Both legs of a transfer
    /// share a reference number; every other transaction gets its own.
    ReferenceNumber
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_increments() {
        assert_eq!(TransactionId::FIRST.successor(), TransactionId::new(2));
        assert_eq!(AccountId::new(41).successor().get(), 42);
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: ReferenceNumber = " 17 ".parse().unwrap();
        assert_eq!(id, ReferenceNumber::new(17));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "12a".parse::<AccountId>().unwrap_err();
        assert_eq!(err, TypeError::InvalidId("12a".into()));
        assert!("".parse::<AccountId>().is_err());
        assert!("-3".parse::<AccountId>().is_err());
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(AccountId::new(7).to_string(), "7");
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&TransactionId::new(9)).unwrap();
        assert_eq!(json, "9");
    }
}
