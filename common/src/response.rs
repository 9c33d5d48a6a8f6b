//! Invocation responses returned to the host.

use serde::{Deserialize, Serialize};

use crate::ChaincodeError;

/// Status code for a successful invocation.
pub const OK: i32 = 200;
/// Status codes at or above this value are failures.
pub const ERROR_THRESHOLD: i32 = 400;
/// Status code for a failed invocation.
pub const ERROR: i32 = 500;

/// Result of an entry-point call, as handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP-like status code.
    pub status: i32,
    /// Human-readable error message; empty on success.
    pub message: String,
    /// Error code for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Response payload; empty on failure.
    pub payload: Vec<u8>,
}

impl Response {
    /// Successful response carrying `payload`.
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: OK,
            message: String::new(),
            code: None,
            payload: payload.into(),
        }
    }

    /// Check if the invocation succeeded.
    pub fn is_ok(&self) -> bool {
        self.status < ERROR_THRESHOLD
    }

    /// Payload as UTF-8 text, lossy.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

impl From<&ChaincodeError> for Response {
    fn from(err: &ChaincodeError) -> Self {
        Self {
            status: ERROR,
            message: err.to_string(),
            code: Some(err.error_code().to_string()),
            payload: Vec::new(),
        }
    }
}

impl From<ChaincodeError> for Response {
    fn from(err: ChaincodeError) -> Self {
        Response::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountName;

    #[test]
    fn test_success_response() {
        let response = Response::success(b"[]".to_vec());
        assert!(response.is_ok());
        assert_eq!(response.status, OK);
        assert_eq!(response.payload_str(), "[]");
    }

    #[test]
    fn test_error_response_from_chaincode_error() {
        let err = ChaincodeError::AccountNotFound(AccountName::new("dale"));
        let response = Response::from(err);
        assert!(!response.is_ok());
        assert_eq!(response.status, ERROR);
        assert_eq!(response.message, "Account does not exist: dale");
        assert_eq!(response.code.as_deref(), Some("ACCOUNT_NOT_FOUND"));
        assert!(response.payload.is_empty());
    }
}
