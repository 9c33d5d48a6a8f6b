//! Argument sanitation shared by the chaincode functions.

use balance_transfer_common::{ChaincodeError, Result};

const POSITIONS: [&str; 3] = ["1st", "2nd", "3rd"];

/// Ordinal label for argument `index` (zero-based), as used in messages.
pub fn position(index: usize) -> &'static str {
    POSITIONS.get(index).copied().unwrap_or("trailing")
}

/// Require exactly `expected` arguments.
pub fn expect_exactly(args: &[String], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(ChaincodeError::ArgumentCount {
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// Require at least `expected` arguments; extras are ignored.
pub fn expect_at_least(args: &[String], expected: usize) -> Result<()> {
    if args.len() < expected {
        return Err(ChaincodeError::ArgumentCount {
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// Argument `index` must be non-empty.
pub fn non_empty(args: &[String], index: usize) -> Result<&str> {
    match args.get(index).map(String::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ChaincodeError::EmptyArgument {
            position: position(index),
        }),
    }
}

/// Argument `index` must parse as a signed integer. A leading `+` or `-`
/// is accepted; whitespace is not.
pub fn integer(args: &[String], index: usize) -> Result<i64> {
    let raw = args.get(index).map(String::as_str).unwrap_or_default();
    raw.parse::<i64>().map_err(|_| ChaincodeError::NotNumeric {
        position: position(index),
        value: raw.to_string(),
    })
}
