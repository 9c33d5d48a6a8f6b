//! Functions the dispatcher routes to.

use std::fmt;
use std::str::FromStr;

use balance_transfer_common::ChaincodeError;

/// A chaincode function, resolved once from the invoked name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Create a new account.
    CreateAccount,
    /// Read an account record.
    GetAccount,
    /// Move balance between two accounts.
    Transfer,
    /// Run a rich query over world state.
    Query,
}

impl Function {
    /// All functions, in dispatch order.
    pub const ALL: [Function; 4] = [
        Function::CreateAccount,
        Function::GetAccount,
        Function::Transfer,
        Function::Query,
    ];

    /// Name the host invokes this function by.
    pub fn as_str(&self) -> &'static str {
        match self {
            Function::CreateAccount => "createaccount",
            Function::GetAccount => "getaccount",
            Function::Transfer => "transfer",
            Function::Query => "query",
        }
    }
}

impl FromStr for Function {
    type Err = ChaincodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ChaincodeError::UnknownFunction(s.to_string()))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
