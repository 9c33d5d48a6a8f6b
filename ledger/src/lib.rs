//! Balance Transfer Ledger
//!
//! World-state access for the chaincode. The host owns the store; the
//! chaincode only sees it through [`StateStore`], a per-invocation stub whose
//! writes are buffered until the host commits them.
//!
//! [`MemoryStore`] is an in-memory host used by tests and the simulator. It
//! evaluates Mango-style rich queries (see [`selector`]) and keeps count of
//! open result cursors so callers can check that every cursor is released.

pub mod iterator;
pub mod memory;
pub mod selector;
pub mod store;

pub use iterator::{KeyValue, ScopedCursor, StateQueryIterator};
pub use memory::{Fault, MemoryStore, Transaction};
pub use selector::Query;
pub use store::{StateStore, TxContext};
