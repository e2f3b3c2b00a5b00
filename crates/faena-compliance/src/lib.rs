//! Compliance arithmetic over any [`faena_core::store::SiteStore`].
//!
//! Read-only: answers "which mandatory documents are missing" per worker
//! and per site, and produces the per-site progress table behind listing
//! and semaphore displays. Nothing here mutates the store.

mod engine;

pub mod error;

pub use engine::{
  ComplianceEngine, Semaphore, SiteProgressRow, WorkerPending, semaphore,
};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
