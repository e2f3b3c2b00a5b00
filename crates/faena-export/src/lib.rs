//! Export archives for sites and calendar months.
//!
//! Builders are pure functions of current store state plus the filesystem:
//! they return fresh ZIP bytes and never mutate records. Persisting an
//! archive (writing it under the upload root and appending a history row)
//! is the separate, explicit `persist_*` step.

mod builder;
mod manifest;

pub mod error;

pub use builder::{ArchiveBuilder, SiteArchiveOptions};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
