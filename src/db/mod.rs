//! Durable storage: SQLite connection setup and credential persistence.
//!
//! External modules should import from `techendeavor::db`; the repository API
//! is re-exported here.

pub mod repo;

pub use repo::*;
