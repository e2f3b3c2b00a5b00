//! Error type for `faena-export`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("site not found: {0}")]
  SiteNotFound(i64),

  #[error("no sites started in {0}")]
  EmptyMonth(String),

  #[error(transparent)]
  Compliance(#[from] faena_compliance::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("archive error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Wrap a backend error, whatever its concrete type.
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
