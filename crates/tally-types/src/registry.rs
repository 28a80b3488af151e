use serde::{Deserialize, Serialize};

use crate::ids::AccountId;
use crate::temporal::Timestamp;

/// One row of the account registry: proof that an account was created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub account_id: AccountId,
    pub display_name: String,
    pub created_at: Timestamp,
}
