//! Balance Transfer Common Types
//!
//! This crate contains the types shared by the chaincode, the state store and
//! the simulator: account records and their storage keys, transaction
//! identifiers, invocation responses and the error taxonomy.

pub mod account;
pub mod error;
pub mod identifiers;
pub mod response;

pub use account::*;
pub use error::*;
pub use identifiers::*;
pub use response::*;
