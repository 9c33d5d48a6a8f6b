//! Identifier types for accounts and transactions.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a host transaction (one invocation).
/// Uses UUID v7 for time-ordered identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(Uuid);

impl TxId {
    /// Create a new transaction ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account name, doubling as the account's storage key.
///
/// Names are case-insensitive: the value is lowercased once on construction,
/// so `Alice`, `ALICE` and `alice` all address the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    /// Create a new account name, normalizing to lowercase.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_lowercase())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key the account record is stored under.
    pub fn storage_key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_id_creation() {
        let id1 = TxId::new();
        let id2 = TxId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_tx_id_parse() {
        let uuid_str = "019456ab-1234-7def-8901-234567890abc";
        let id = TxId::parse(uuid_str).unwrap();
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn test_account_name_is_lowercased() {
        assert_eq!(AccountName::new("Alice").as_str(), "alice");
        assert_eq!(AccountName::from("BOB"), AccountName::from("bob"));
        assert_eq!(AccountName::new("dave").storage_key(), "dave");
    }

    #[test]
    fn test_account_name_deserialize_normalizes() {
        let name: AccountName = serde_json::from_str("\"Charlie\"").unwrap();
        assert_eq!(name.as_str(), "charlie");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"charlie\"");
    }
}
