//! Append-only history rows for produced artifacts.
//!
//! Export rows are never mutated. Auto-backup rows are subject to
//! retention pruning; everything else only grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted site export archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
  pub id:         i64,
  pub site_id:    i64,
  pub file_path:  String,
  pub sha256:     String,
  pub size_bytes: i64,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::SiteStore::record_export`].
#[derive(Debug, Clone)]
pub struct NewExportRecord {
  pub site_id:    i64,
  pub file_path:  String,
  pub sha256:     String,
  pub size_bytes: i64,
}

/// One persisted monthly export archive, keyed by `YYYY-MM`.
///
/// Hash and size are optional: rows written by early versions carried
/// neither, and restored backups must round-trip them as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyExportRecord {
  pub id:         i64,
  pub year_month: String,
  pub file_path:  String,
  pub sha256:     Option<String>,
  pub size_bytes: Option<i64>,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::SiteStore::record_monthly_export`].
#[derive(Debug, Clone)]
pub struct NewMonthlyExportRecord {
  pub year_month: String,
  pub file_path:  String,
  pub sha256:     Option<String>,
  pub size_bytes: Option<i64>,
}

/// One automatic database-only snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoBackupRecord {
  pub id:         i64,
  pub tag:        Option<String>,
  pub file_path:  String,
  pub sha256:     String,
  pub size_bytes: i64,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::SiteStore::record_auto_backup`].
#[derive(Debug, Clone)]
pub struct NewAutoBackupRecord {
  pub tag:        Option<String>,
  pub file_path:  String,
  pub sha256:     String,
  pub size_bytes: i64,
}
