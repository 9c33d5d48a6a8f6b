//! The state access interface the host hands to each invocation.

use balance_transfer_common::{StoreError, TxId};
use chrono::{DateTime, Utc};

use crate::iterator::StateQueryIterator;

/// Per-invocation transaction context supplied by the host.
#[derive(Debug, Clone)]
pub struct TxContext {
    /// Transaction identifier.
    pub tx_id: TxId,
    /// Channel the invocation runs on.
    pub channel_id: String,
    /// Host-assigned transaction timestamp.
    pub timestamp: DateTime<Utc>,
}

impl TxContext {
    /// Create a context for a fresh transaction on `channel_id`.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            tx_id: TxId::new(),
            channel_id: channel_id.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Key/value state as seen from inside one invocation.
///
/// Reads observe committed state only; writes go to the invocation's write
/// set and become visible once the host commits it. A failed invocation's
/// write set is discarded by the host.
pub trait StateStore: Send {
    /// Transaction context of the running invocation.
    fn context(&self) -> &TxContext;

    /// Transaction identifier of the running invocation.
    fn tx_id(&self) -> TxId {
        self.context().tx_id
    }

    /// Host-assigned timestamp of the running invocation.
    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.context().timestamp
    }

    /// Read the value stored under `key`, or `None` if absent. The empty key
    /// never holds a value.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Record a write of `value` under `key`. The empty key is rejected.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Cursor over keys in `[start, end)` in key order. An empty bound is
    /// unbounded on that side.
    fn get_state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Box<dyn StateQueryIterator + '_>, StoreError>;

    /// Cursor over records matching a store-interpreted query expression.
    fn get_query_result(&self, query: &str)
        -> Result<Box<dyn StateQueryIterator + '_>, StoreError>;
}
