//! Error type for `faena-compliance`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("site not found: {0}")]
  SiteNotFound(i64),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error, whatever its concrete type.
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
