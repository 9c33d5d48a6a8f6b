//! Account record as stored in world state.

use serde::{Deserialize, Serialize};

use crate::{AccountName, ChaincodeError, Result};

/// Type tag written into every account record.
pub const ACCOUNT_DOC_TYPE: &str = "account";

/// A ledger account.
///
/// The JSON field names are part of the storage format: rich queries issued
/// against the state database address them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Record type tag, always [`ACCOUNT_DOC_TYPE`].
    #[serde(rename = "docType")]
    pub doc_type: String,
    /// External reference identifier.
    #[serde(rename = "accountid")]
    pub account_id: String,
    /// Account name; also the storage key.
    pub name: AccountName,
    /// Current balance. May go negative.
    pub balance: i64,
}

impl Account {
    /// Create a new account.
    pub fn new(account_id: impl Into<String>, name: AccountName, balance: i64) -> Self {
        Self {
            doc_type: ACCOUNT_DOC_TYPE.to_string(),
            account_id: account_id.into(),
            name,
            balance,
        }
    }

    /// Decode a record read from state under `key`.
    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ChaincodeError::serialization(key, e))
    }

    /// Encode the record for writing to state.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ChaincodeError::serialization(self.name.as_str(), e))
    }

    /// Subtract `amount` from the balance. No lower bound is enforced.
    pub fn debit(&mut self, amount: i64) -> Result<()> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| ChaincodeError::BalanceOverflow(self.name.clone()))?;
        Ok(())
    }

    /// Add `amount` to the balance.
    pub fn credit(&mut self, amount: i64) -> Result<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| ChaincodeError::BalanceOverflow(self.name.clone()))?;
        Ok(())
    }
}
