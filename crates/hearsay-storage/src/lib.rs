//! # hearsay-storage
//!
//! Persistent store for identities, captured messages and profiles
//! (SQLite-backed), plus the in-memory consent cache mirroring it.

pub mod consent;
pub mod store;

pub use consent::ConsentCache;
pub use store::Store;
