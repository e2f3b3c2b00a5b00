//! Error types for `faena-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("site not found: {0}")]
  SiteNotFound(i64),

  #[error("worker not found: {0}")]
  WorkerNotFound(i64),

  #[error("contract not found: {0}")]
  ContractNotFound(i64),

  #[error("invalid site dates: {0}")]
  InvalidDates(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
