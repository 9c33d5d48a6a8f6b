//! Balance Transfer Chaincode
//!
//! The account chaincode the host platform invokes. It keeps one JSON record
//! per account, keyed by lowercased account name, and exposes four
//! functions through a single dispatcher:
//!
//! | function | args | payload |
//! |---|---|---|
//! | `createaccount` | id, name, balance | empty |
//! | `getaccount` | name | stored record |
//! | `transfer` | source, destination, amount | empty |
//! | `query` | query expression | `[{"Key":..,"Record":..}, ...]` |
//!
//! # Example
//!
//! ```rust,ignore
//! use balance_transfer_chaincode::{AccountChaincode, Chaincode, ChaincodeConfig};
//! use balance_transfer_ledger::MemoryStore;
//!
//! let chaincode = AccountChaincode::new(ChaincodeConfig::default());
//! let store = MemoryStore::new("mychannel");
//!
//! let mut tx = store.begin();
//! let args = vec!["A12345".into(), "alice".into(), "200".into()];
//! let response = chaincode.invoke(&mut tx, "createaccount", &args).await;
//! if response.is_ok() {
//!     tx.commit();
//! }
//! ```

pub mod args;
pub mod config;
pub mod function;
pub mod handler;
pub mod invocation;
pub mod metrics;
pub mod query;

pub use config::ChaincodeConfig;
pub use function::Function;
pub use handler::{AccountChaincode, Chaincode};
pub use invocation::Invocation;
pub use metrics::{Metrics, MetricsSnapshot, SharedMetrics};
