//! In-memory host store.
//!
//! Plays the host's part for tests and the simulator: holds committed world
//! state, hands out per-invocation [`Transaction`] stubs that buffer writes,
//! and applies a write set only when the host commits it.

use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use balance_transfer_common::StoreError;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::iterator::{KeyValue, StateQueryIterator};
use crate::selector::Query;
use crate::store::{StateStore, TxContext};

/// Failure injected into the store, for exercising error paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Reads of this key fail.
    ReadFailure { key: String },
    /// Writes of this key fail.
    WriteFailure { key: String },
    /// Cursors fail after yielding this many entries.
    IterationFailure { after: usize },
}

/// Thread-safe in-memory world state.
pub struct MemoryStore {
    channel_id: String,
    state: RwLock<BTreeMap<String, Vec<u8>>>,
    faults: Mutex<Vec<Fault>>,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create an empty store for `channel_id`.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            state: RwLock::new(BTreeMap::new()),
            faults: Mutex::new(Vec::new()),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start a transaction for one invocation.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            store: self,
            context: TxContext::new(self.channel_id.clone()),
            writes: BTreeMap::new(),
        }
    }

    /// Read committed state directly, bypassing any transaction.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.state.read().get(key).cloned()
    }

    /// Check if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Number of cursors handed out and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Inject a fault.
    pub fn inject_fault(&self, fault: Fault) {
        info!(fault = ?fault, "Injecting store fault");
        self.faults.lock().push(fault);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    fn read_fails(&self, key: &str) -> bool {
        self.faults
            .lock()
            .iter()
            .any(|f| matches!(f, Fault::ReadFailure { key: k } if k == key))
    }

    fn write_fails(&self, key: &str) -> bool {
        self.faults
            .lock()
            .iter()
            .any(|f| matches!(f, Fault::WriteFailure { key: k } if k == key))
    }

    fn iteration_fails_after(&self) -> Option<usize> {
        self.faults.lock().iter().find_map(|f| match f {
            Fault::IterationFailure { after } => Some(*after),
            _ => None,
        })
    }

    fn open_cursor(&self, rows: VecDeque<KeyValue>) -> Box<MemoryCursor> {
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Box::new(MemoryCursor {
            rows,
            yielded: 0,
            fail_after: self.iteration_fails_after(),
            closed: false,
            open_cursors: self.open_cursors.clone(),
        })
    }

    fn apply(&self, writes: BTreeMap<String, Vec<u8>>) -> usize {
        let count = writes.len();
        let mut state = self.state.write();
        state.extend(writes);
        count
    }
}

/// Per-invocation stub over a [`MemoryStore`].
///
/// Reads see committed state only, as on the platform; an invocation does
/// not read its own writes. Dropping the transaction without committing
/// discards its write set.
pub struct Transaction<'a> {
    store: &'a MemoryStore,
    context: TxContext,
    writes: BTreeMap<String, Vec<u8>>,
}

impl Transaction<'_> {
    /// Keys written so far, in key order.
    pub fn write_set(&self) -> impl Iterator<Item = &str> {
        self.writes.keys().map(String::as_str)
    }

    /// Apply the write set to committed state. Returns the number of keys
    /// written.
    pub fn commit(self) -> usize {
        let tx_id = self.context.tx_id;
        let count = self.store.apply(self.writes);
        debug!(tx_id = %tx_id, writes = count, "Transaction committed");
        count
    }

    /// Discard the write set.
    pub fn rollback(self) {
        debug!(
            tx_id = %self.context.tx_id,
            writes = self.writes.len(),
            "Transaction rolled back"
        );
    }
}

impl StateStore for Transaction<'_> {
    fn context(&self) -> &TxContext {
        &self.context
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if key.is_empty() {
            return Ok(None);
        }
        if self.store.read_fails(key) {
            return Err(StoreError::Read {
                key: key.to_string(),
                reason: "injected read failure".to_string(),
            });
        }
        Ok(self.store.get(key))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if self.store.write_fails(key) {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Box<dyn StateQueryIterator + '_>, StoreError> {
        let lower = match start {
            "" => Bound::Unbounded,
            s => Bound::Included(s.to_string()),
        };
        let upper = match end {
            "" => Bound::Unbounded,
            e => Bound::Excluded(e.to_string()),
        };
        if let (Bound::Included(s), Bound::Excluded(e)) = (&lower, &upper) {
            if s > e {
                return Err(StoreError::InvalidQuery(format!(
                    "range start {s} is after end {e}"
                )));
            }
        }

        let rows = self
            .store
            .state
            .read()
            .range((lower, upper))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(self.store.open_cursor(rows))
    }

    fn get_query_result(
        &self,
        query: &str,
    ) -> Result<Box<dyn StateQueryIterator + '_>, StoreError> {
        let query = Query::parse(query)?;
        let limit = query.limit().unwrap_or(usize::MAX);

        let rows: VecDeque<KeyValue> = self
            .store
            .state
            .read()
            .iter()
            .filter(|(_, value)| {
                serde_json::from_slice::<serde_json::Value>(value)
                    .map(|doc| query.matches(&doc))
                    .unwrap_or(false)
            })
            .take(limit)
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();

        debug!(tx_id = %self.context.tx_id, matches = rows.len(), "Rich query evaluated");
        Ok(self.store.open_cursor(rows))
    }
}

/// Cursor over a snapshot of matching entries.
///
/// Does not close itself on drop: like a host-side cursor, it stays
/// registered until `close` is called.
struct MemoryCursor {
    rows: VecDeque<KeyValue>,
    yielded: usize,
    fail_after: Option<usize>,
    closed: bool,
    open_cursors: Arc<AtomicUsize>,
}

impl StateQueryIterator for MemoryCursor {
    fn has_next(&self) -> bool {
        !self.closed && !self.rows.is_empty()
    }

    fn next_entry(&mut self) -> Result<KeyValue, StoreError> {
        if self.closed {
            return Err(StoreError::CursorClosed);
        }
        if self.fail_after == Some(self.yielded) {
            return Err(StoreError::Iteration(format!(
                "injected failure after {} entries",
                self.yielded
            )));
        }
        let entry = self
            .rows
            .pop_front()
            .ok_or_else(|| StoreError::Iteration("no more results".to_string()))?;
        self.yielded += 1;
        Ok(entry)
    }

    fn close(&mut self) -> Result<(), StoreError> {
        if !self.closed {
            self.closed = true;
            self.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
