//! [`BackupManager`] — snapshot production and retention pruning.

use std::{
  fs,
  io::{Cursor, Write},
  path::Path,
};

use chrono::{SecondsFormat, Utc};
use tracing::warn;
use walkdir::WalkDir;
use zip::{CompressionMethod, write::FileOptions, write::ZipWriter};

use faena_core::{
  history::{AutoBackupRecord, NewAutoBackupRecord},
  integrity::{sanitize_segment, sha256_hex},
  layout::{DB_FILE_NAME, StorageLayout, UPLOAD_DIR_NAME, timestamp_token},
  store::SiteStore,
};
use faena_store_sqlite::SqliteStore;

use crate::{Error, Result};

/// How many auto-backup records retention keeps by default.
pub const DEFAULT_KEEP_LAST: usize = 20;

/// Fixed root segment every entry of a full snapshot lives under.
const SNAPSHOT_ROOT: &str = "backup";

/// Produces snapshots of a concrete [`SqliteStore`] and its upload tree.
///
/// Tied to the SQLite backend on purpose: snapshots are file-level copies
/// of that backend's on-disk state.
pub struct BackupManager {
  store:     SqliteStore,
  layout:    StorageLayout,
  keep_last: usize,
}

impl BackupManager {
  pub fn new(store: SqliteStore, layout: StorageLayout) -> Self {
    Self { store, layout, keep_last: DEFAULT_KEEP_LAST }
  }

  /// Override the retention depth (number of auto-backup rows kept).
  pub fn with_retention(mut self, keep_last: usize) -> Self {
    self.keep_last = keep_last;
    self
  }

  /// Full snapshot: the database file, every file under the upload root,
  /// and a metadata entry, all under the `backup/` prefix. The
  /// disaster-recovery path — no filtering, no retention.
  pub async fn full_snapshot(&self) -> Result<Vec<u8>> {
    let db_bytes = self.read_database().await?;

    let options = zip_options();
    let mut buffer = Vec::new();
    {
      let mut zip = ZipWriter::new(Cursor::new(&mut buffer));

      zip.start_file(format!("{SNAPSHOT_ROOT}/{DB_FILE_NAME}"), options)?;
      zip.write_all(&db_bytes)?;

      let upload_root = self.layout.upload_root();
      if upload_root.is_dir() {
        for entry in WalkDir::new(&upload_root)
          .sort_by_file_name()
          .into_iter()
          .filter_map(|e| e.ok())
        {
          if !entry.file_type().is_file() {
            continue;
          }
          let Ok(rel) = entry.path().strip_prefix(&upload_root) else {
            continue;
          };
          zip.start_file(
            format!(
              "{SNAPSHOT_ROOT}/{UPLOAD_DIR_NAME}/{}",
              zip_entry_name(rel)
            ),
            options,
          )?;
          zip.write_all(&fs::read(entry.path())?)?;
        }
      }

      zip.start_file(format!("{SNAPSHOT_ROOT}/META.txt"), options)?;
      zip.write_all(
        format!(
          "created_at_utc={}\n",
          Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )
        .as_bytes(),
      )?;

      zip.finish()?;
    }

    Ok(buffer)
  }

  /// Automatic snapshot: the database bytes only, written under the
  /// auto-backups directory with a timestamped name derived from `tag`,
  /// recorded in history, then pruned to the newest `keep_last` rows.
  ///
  /// Cheap relative to [`Self::full_snapshot`]; safe to call after every
  /// mutation.
  pub async fn auto_snapshot(&self, tag: &str) -> Result<AutoBackupRecord> {
    let db_bytes = self.read_database().await?;

    let file_name = format!(
      "auto_db_{}_{}.db",
      timestamp_token(Utc::now()),
      sanitize_segment(tag),
    );
    let dir = self.layout.auto_backups_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);
    fs::write(&path, &db_bytes)?;

    let record = self
      .store
      .record_auto_backup(NewAutoBackupRecord {
        tag:        Some(tag.to_owned()),
        file_path:  path.to_string_lossy().into_owned(),
        sha256:     sha256_hex(&db_bytes),
        size_bytes: db_bytes.len() as i64,
      })
      .await
      .map_err(Error::store)?;

    // Retention is best-effort: a cleanup failure never fails the
    // snapshot that triggered it.
    self.prune_auto_backups().await;

    Ok(record)
  }

  async fn prune_auto_backups(&self) {
    let rows = match self.store.auto_backups().await {
      Ok(rows) => rows,
      Err(e) => {
        warn!(error = %e, "could not list auto-backups for retention");
        return;
      }
    };
    if rows.len() <= self.keep_last {
      return;
    }

    let stale = &rows[self.keep_last..];
    for row in stale {
      if let Err(e) = fs::remove_file(&row.file_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
          warn!(path = %row.file_path, error = %e,
                "could not delete pruned auto-backup file");
        }
      }
    }

    let ids: Vec<i64> = stale.iter().map(|r| r.id).collect();
    if let Err(e) = self.store.delete_auto_backups(&ids).await {
      warn!(error = %e, "could not delete pruned auto-backup rows");
    }
  }

  /// Checkpoint the WAL, then read the database file. Without the
  /// checkpoint a file-level copy can miss committed writes still sitting
  /// in the WAL.
  async fn read_database(&self) -> Result<Vec<u8>> {
    self.store.checkpoint().await.map_err(Error::store)?;
    Ok(fs::read(self.layout.db_path())?)
  }
}

/// Join path components with `/` regardless of platform separator.
pub(crate) fn zip_entry_name(rel: &Path) -> String {
  rel
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

pub(crate) fn zip_options() -> FileOptions {
  FileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .unix_permissions(0o644)
}
