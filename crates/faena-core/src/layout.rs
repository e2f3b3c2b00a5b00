//! On-disk layout of the persisted state.
//!
//! Everything lives under one data root: the structured database file and
//! the upload tree (document binaries, persisted exports, auto-backups).
//! All path derivation goes through [`StorageLayout`] so the export and
//! backup crates agree on where things are.

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

/// File name of the structured-data database inside the data root. Backup
/// archives use the same name under their `backup/` prefix; restore relies
/// on it when probing legacy layouts.
pub const DB_FILE_NAME: &str = "app.db";

/// Directory name of the upload tree inside the data root (and inside
/// backup archives).
pub const UPLOAD_DIR_NAME: &str = "uploads";

/// Path derivation from a single data root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
  root: PathBuf,
}

impl StorageLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// The structured-data database file.
  pub fn db_path(&self) -> PathBuf { self.root.join(DB_FILE_NAME) }

  /// Root of the uploaded-file tree.
  pub fn upload_root(&self) -> PathBuf { self.root.join(UPLOAD_DIR_NAME) }

  /// Directory persisted site exports are written to.
  pub fn site_exports_dir(&self, site_id: i64) -> PathBuf {
    self
      .upload_root()
      .join("exports")
      .join(format!("faena_{site_id}"))
  }

  /// Directory persisted monthly exports are written to.
  pub fn monthly_exports_dir(&self) -> PathBuf {
    self.upload_root().join("exports").join("mes")
  }

  /// Directory automatic database snapshots are written to.
  pub fn auto_backups_dir(&self) -> PathBuf {
    self.upload_root().join("auto_backups")
  }

  /// Create the data root and the well-known upload subdirectories.
  /// Idempotent.
  pub fn ensure_dirs(&self) -> io::Result<()> {
    fs::create_dir_all(&self.root)?;
    fs::create_dir_all(self.upload_root())?;
    fs::create_dir_all(self.upload_root().join("exports"))?;
    fs::create_dir_all(self.auto_backups_dir())?;
    Ok(())
  }

  /// Write an uploaded binary under the upload root, creating intermediate
  /// directories, and return its full path.
  pub fn save_upload(
    &self,
    parts: &[&str],
    file_name: &str,
    bytes: &[u8],
  ) -> io::Result<PathBuf> {
    let mut dir = self.upload_root();
    for part in parts {
      dir.push(part);
    }
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;
    Ok(path)
  }
}

/// Compact UTC timestamp token used in persisted artifact file names.
pub fn timestamp_token(at: DateTime<Utc>) -> String {
  at.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn paths_hang_off_the_root() {
    let layout = StorageLayout::new("/srv/faena");
    assert_eq!(layout.db_path(), PathBuf::from("/srv/faena/app.db"));
    assert_eq!(layout.upload_root(), PathBuf::from("/srv/faena/uploads"));
    assert_eq!(
      layout.site_exports_dir(3),
      PathBuf::from("/srv/faena/uploads/exports/faena_3")
    );
    assert_eq!(
      layout.auto_backups_dir(),
      PathBuf::from("/srv/faena/uploads/auto_backups")
    );
  }
}
