//! Tolerant restore from heterogeneous backup archives.
//!
//! The happy path is an archive produced by
//! [`BackupManager::full_snapshot`](crate::BackupManager::full_snapshot),
//! but users hand over whatever they have: older layouts, database-only
//! zips, or — the classic support case — a zip of the application sources
//! with no data in it at all. The search is an explicit ordered candidate
//! list, then an extension scan; the sources-only case gets its own
//! diagnosis instead of a generic not-found.

use std::{
  fs,
  io::Cursor,
  path::{Path, PathBuf},
};

use tracing::info;
use walkdir::WalkDir;

use faena_core::layout::{StorageLayout, UPLOAD_DIR_NAME};
use faena_store_sqlite::SqliteStore;

use crate::{Error, Result};

/// Database locations tried in order, newest layout first.
const DB_CANDIDATES: &[&str] =
  &["backup/app.db", "app.db", "backup/DB/app.db", "data/app.db"];

/// Extensions the fallback scan recognises as a database payload.
const DATA_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

/// File names that mark an extracted tree as application sources.
const SOURCE_MARKERS: &[&str] =
  &["streamlit_app.py", "Cargo.toml", "requirements.txt"];

/// What a successful restore produced.
#[derive(Debug)]
pub struct RestoreOutcome {
  /// The store reopened on the restored database, schema reconciled.
  /// Callers must use this handle; handles opened before the restore
  /// still point at the replaced file.
  pub store:            SqliteStore,
  /// Whether the archive carried an upload tree that replaced the live
  /// one.
  pub uploads_replaced: bool,
}

/// Restore the persisted state under `layout` from backup `bytes`.
///
/// The archive is extracted into a scratch directory inside the data root
/// (so the final renames never cross filesystems); the scratch directory
/// is removed on every exit path. The database replacement is
/// rename-based, never an in-place truncation. Schema reconcile runs
/// unconditionally via the reopen.
///
/// Live store handles must be dropped before calling this.
pub async fn restore(
  layout: &StorageLayout,
  bytes: &[u8],
) -> Result<RestoreOutcome> {
  layout.ensure_dirs()?;
  let scratch = tempfile::Builder::new()
    .prefix("restore_")
    .tempdir_in(layout.root())?;

  let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
    .map_err(|e| Error::InvalidArchive(e.to_string()))?;
  archive
    .extract(scratch.path())
    .map_err(|e| Error::InvalidArchive(e.to_string()))?;

  let Some(db_file) = locate_database(scratch.path()) else {
    if looks_like_code_backup(scratch.path()) {
      return Err(Error::CodeBackup);
    }
    return Err(Error::NoDatabase);
  };
  info!(candidate = %db_file.display(), "database payload located");

  // Drop any WAL sidecars of the database being replaced; a stale WAL
  // would otherwise be replayed into the restored file on next open.
  let db_path = layout.db_path();
  for suffix in ["-wal", "-shm"] {
    let mut sidecar = db_path.clone().into_os_string();
    sidecar.push(suffix);
    let _ = fs::remove_file(PathBuf::from(sidecar));
  }
  fs::rename(&db_file, &db_path)?;

  // An upload tree, under the current or the legacy root name, replaces
  // the live one wholesale.
  let current = scratch.path().join("backup").join(UPLOAD_DIR_NAME);
  let legacy = scratch.path().join(UPLOAD_DIR_NAME);
  let upload_src = [current, legacy].into_iter().find(|p| p.is_dir());

  let uploads_replaced = match upload_src {
    Some(src) => {
      let dst = layout.upload_root();
      if dst.exists() {
        fs::remove_dir_all(&dst)?;
      }
      fs::rename(&src, &dst)?;
      true
    }
    None => false,
  };

  // Recreate the well-known subdirectories the replacement may not carry,
  // then reopen: the open runs the base DDL and the column reconcile, so
  // a backup from an older schema version comes up migrated.
  layout.ensure_dirs()?;
  let store =
    SqliteStore::open(&db_path).await.map_err(Error::store)?;

  Ok(RestoreOutcome { store, uploads_replaced })
}

/// Find the database payload: exact candidates first, then any file with a
/// recognised extension.
fn locate_database(root: &Path) -> Option<PathBuf> {
  for candidate in DB_CANDIDATES {
    let path = root.join(candidate);
    if path.is_file() {
      return Some(path);
    }
  }

  WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.ok())
    .find(|entry| {
      entry.file_type().is_file()
        && entry
          .path()
          .extension()
          .and_then(|ext| ext.to_str())
          .is_some_and(|ext| {
            DATA_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d))
          })
    })
    .map(|entry| entry.into_path())
}

/// Heuristic: does the extracted tree look like application sources?
fn looks_like_code_backup(root: &Path) -> bool {
  WalkDir::new(root)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .any(|entry| {
      let name = entry.file_name().to_string_lossy();
      if SOURCE_MARKERS.iter().any(|m| name == *m) {
        return true;
      }
      entry
        .path()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "rs" || ext == "py")
    })
}

#[cfg(test)]
mod unit {
  use faena_core::layout::DB_FILE_NAME;

  use super::*;

  // The first candidate must stay in sync with what full_snapshot writes.
  #[test]
  fn first_candidate_matches_snapshot_layout() {
    assert_eq!(DB_CANDIDATES[0], format!("backup/{DB_FILE_NAME}"));
  }
}
