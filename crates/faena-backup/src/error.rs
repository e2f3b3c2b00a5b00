//! Error type for `faena-backup`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The uploaded bytes are not a readable ZIP archive.
  #[error("not a valid backup archive: {0}")]
  InvalidArchive(String),

  /// A readable archive, but no database payload anywhere inside it.
  #[error("the archive does not contain a database (.db/.sqlite)")]
  NoDatabase,

  /// A readable archive containing application sources instead of data.
  /// Distinct from [`Error::NoDatabase`] so callers can tell users they
  /// grabbed the wrong kind of backup.
  #[error(
    "this archive is a code backup (it contains application sources), not \
     a data backup; restoring requires an archive with backup/app.db"
  )]
  CodeBackup,

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
