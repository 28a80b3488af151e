//! Column layouts of the three log files.
//!
//! The per-account log shares [`TRANSACTION_COLUMNS`] with the system-wide
//! log; only the set of rows differs.

pub const TRANSACTION_ID: &str = "transaction_id";
pub const STARTED_AT: &str = "started_at";
pub const ACCOUNT_ID: &str = "account_id";
pub const DISPLAY_NAME: &str = "display_name";
pub const TYPE: &str = "type";
pub const AMOUNT: &str = "amount";
pub const CURRENCY: &str = "currency";
pub const RESULTING_BALANCE: &str = "resulting_balance";
pub const COUNTERPARTY_ACCOUNT_ID: &str = "counterparty_account_id";
pub const COUNTERPARTY_DISPLAY_NAME: &str = "counterparty_display_name";
pub const REFERENCE_NUMBER: &str = "reference_number";
pub const COMPLETED_AT: &str = "completed_at";
pub const STATUS: &str = "status";
pub const REMARKS: &str = "remarks";
pub const CREATED_AT: &str = "created_at";

/// Header of the system-wide and per-account transaction logs.
pub const TRANSACTION_COLUMNS: [&str; 14] = [
    TRANSACTION_ID,
    STARTED_AT,
    ACCOUNT_ID,
    DISPLAY_NAME,
    TYPE,
    AMOUNT,
    CURRENCY,
    RESULTING_BALANCE,
    COUNTERPARTY_ACCOUNT_ID,
    COUNTERPARTY_DISPLAY_NAME,
    REFERENCE_NUMBER,
    COMPLETED_AT,
    STATUS,
    REMARKS,
];

/// Header of the account registry.
pub const REGISTRY_COLUMNS: [&str; 3] = [ACCOUNT_ID, DISPLAY_NAME, CREATED_AT];
