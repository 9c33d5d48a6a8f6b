//! Rich query execution and result materialization.

use serde::Serialize;
use serde_json::value::RawValue;
use tracing::debug;

use balance_transfer_common::{ChaincodeError, Result};
use balance_transfer_ledger::{ScopedCursor, StateStore};

/// One element of a query response.
#[derive(Serialize)]
struct QueryResult<'a> {
    #[serde(rename = "Key")]
    key: &'a str,
    /// Stored record, embedded as-is.
    #[serde(rename = "Record")]
    record: &'a RawValue,
}

/// Serialize every entry of `cursor` into a JSON array of
/// `{"Key": <key>, "Record": <record>}` objects, in cursor order.
///
/// The cursor is released when this returns, whether it was fully consumed
/// or not.
pub fn build_query_response(cursor: ScopedCursor<'_>) -> Result<Vec<u8>> {
    let mut buffer = vec![b'['];
    let mut written = 0usize;

    for entry in cursor {
        let entry = entry?;
        let record: &RawValue = serde_json::from_slice(&entry.value)
            .map_err(|e| ChaincodeError::serialization(&entry.key, e))?;

        if written > 0 {
            buffer.push(b',');
        }
        serde_json::to_writer(
            &mut buffer,
            &QueryResult {
                key: &entry.key,
                record,
            },
        )
        .map_err(|e| ChaincodeError::serialization(&entry.key, e))?;
        written += 1;
    }

    buffer.push(b']');
    debug!(results = written, "Query response built");
    Ok(buffer)
}

/// Execute `query` against the store and return the serialized results.
pub fn query_result_for_query_string(stub: &dyn StateStore, query: &str) -> Result<Vec<u8>> {
    debug!(query = %query, "Executing rich query");
    let cursor = ScopedCursor::new(stub.get_query_result(query)?);
    build_query_response(cursor)
}
