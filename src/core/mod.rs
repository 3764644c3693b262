//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Storage contract consumed by the engine
//! - `store` - Thread-safe in-memory store with row-level locking
//! - `ledger` - Typed lookups of accounts and pockets inside a unit of work
//! - `engine` - Transfer validation and execution

pub mod engine;
pub mod ledger;
pub mod store;
pub mod traits;

pub use engine::TransferEngine;
pub use store::InMemoryStore;
pub use traits::{Store, UnitOfWork};
