//! SQLite backend for the Faena compliance store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Opening a store always runs
//! the base DDL plus a forward-only column reconcile, so databases written
//! by older versions (including restored backups) come up migrated.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
