//! Error types for chaincode invocations and state access.

use crate::AccountName;
use thiserror::Error;

/// Errors raised by the state store the host supplies.
///
/// The cause is opaque to the chaincode: it is reported, never inspected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading a key failed.
    #[error("Failed to get state for {key}: {reason}")]
    Read { key: String, reason: String },

    /// Writing a key failed.
    #[error("Failed to put state for {key}: {reason}")]
    Write { key: String, reason: String },

    /// Keys must be non-empty.
    #[error("Key must not be an empty string")]
    EmptyKey,

    /// The store rejected a query expression.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Advancing a result cursor failed.
    #[error("Query iteration failed: {0}")]
    Iteration(String),

    /// The cursor was used after it was closed.
    #[error("Query cursor already closed")]
    CursorClosed,
}

/// Broad error category, used for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing arguments.
    Validation,
    /// Duplicate account on create.
    Conflict,
    /// Missing account on lookup or transfer.
    NotFound,
    /// Underlying read, write or query failure.
    Store,
    /// Stored bytes do not decode.
    Serialization,
    /// Function name not recognized by the dispatcher.
    UnknownFunction,
}

/// Main error type for chaincode operations.
#[derive(Error, Debug)]
pub enum ChaincodeError {
    /// Wrong number of arguments.
    #[error("Incorrect number of arguments. Expecting {expected}")]
    ArgumentCount { expected: usize, actual: usize },

    /// A required argument was empty.
    #[error("{position} argument must be a non-empty string")]
    EmptyArgument { position: &'static str },

    /// An argument that must be an integer was not.
    #[error("{position} argument must be a numeric string")]
    NotNumeric {
        position: &'static str,
        value: String,
    },

    /// Applying a transfer would overflow a balance.
    #[error("Balance overflow on account {0}")]
    BalanceOverflow(AccountName),

    /// An account already exists under this name.
    #[error("This account already exists: {0}")]
    AccountExists(AccountName),

    /// No account exists under this name.
    #[error("Account does not exist: {0}")]
    AccountNotFound(AccountName),

    /// State store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A record could not be encoded or decoded.
    #[error("Malformed record under {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Dispatcher received a function name it does not know.
    #[error("Received unknown function invocation: {0}")]
    UnknownFunction(String),
}

impl ChaincodeError {
    /// Wrap a JSON error with the key it concerns.
    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        ChaincodeError::Serialization {
            key: key.into(),
            source,
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChaincodeError::ArgumentCount { .. }
            | ChaincodeError::EmptyArgument { .. }
            | ChaincodeError::NotNumeric { .. }
            | ChaincodeError::BalanceOverflow(_) => ErrorKind::Validation,
            ChaincodeError::AccountExists(_) => ErrorKind::Conflict,
            ChaincodeError::AccountNotFound(_) => ErrorKind::NotFound,
            ChaincodeError::Store(_) => ErrorKind::Store,
            ChaincodeError::Serialization { .. } => ErrorKind::Serialization,
            ChaincodeError::UnknownFunction(_) => ErrorKind::UnknownFunction,
        }
    }

    /// Get error code for failure responses.
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Conflict => "ACCOUNT_EXISTS",
            ErrorKind::NotFound => "ACCOUNT_NOT_FOUND",
            ErrorKind::Store => "STORE_ERROR",
            ErrorKind::Serialization => "SERIALIZATION_ERROR",
            ErrorKind::UnknownFunction => "UNKNOWN_FUNCTION",
        }
    }
}

/// Result type alias for chaincode operations.
pub type Result<T> = std::result::Result<T, ChaincodeError>;
