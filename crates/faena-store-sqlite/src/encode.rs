//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`; timestamps as RFC 3339.
//! Decoding timestamps also accepts zone-less `YYYY-MM-DDTHH:MM:SS`
//! strings (assumed UTC) because restored legacy databases carry them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use faena_core::{
  document::{CompanyDocument, SiteCompanyDocument, WorkerDocument},
  history::{AutoBackupRecord, ExportRecord, MonthlyExportRecord},
  site::{Annex, Site, SiteContract, SiteStatus},
  worker::{Assignment, AssignmentStatus, Worker},
};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_date_opt(s: Option<&str>) -> Result<Option<NaiveDate>> {
  match s {
    Some(s) if !s.is_empty() => Ok(Some(decode_date(s)?)),
    _ => Ok(None),
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_dt_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  match s {
    Some(s) if !s.is_empty() => Ok(Some(decode_dt(s)?)),
    _ => Ok(None),
  }
}

// ─── Status enums ────────────────────────────────────────────────────────────

pub fn encode_site_status(s: SiteStatus) -> &'static str {
  match s {
    SiteStatus::Active => "ACTIVE",
    SiteStatus::Finished => "FINISHED",
  }
}

pub fn decode_site_status(s: &str) -> Result<SiteStatus> {
  match s {
    "ACTIVE" => Ok(SiteStatus::Active),
    "FINISHED" => Ok(SiteStatus::Finished),
    other => Err(Error::DateParse(format!("unknown site status: {other:?}"))),
  }
}

pub fn encode_assignment_status(s: AssignmentStatus) -> &'static str {
  match s {
    AssignmentStatus::Active => "ACTIVE",
    AssignmentStatus::Closed => "CLOSED",
  }
}

pub fn decode_assignment_status(s: &str) -> Result<AssignmentStatus> {
  match s {
    "ACTIVE" => Ok(AssignmentStatus::Active),
    "CLOSED" => Ok(AssignmentStatus::Closed),
    other => {
      Err(Error::DateParse(format!("unknown assignment status: {other:?}")))
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `sites` row.
pub struct RawSite {
  pub id:          i64,
  pub client_id:   i64,
  pub contract_id: Option<i64>,
  pub name:        String,
  pub location:    String,
  pub start_date:  String,
  pub end_date:    Option<String>,
  pub status:      String,
}

impl RawSite {
  pub fn into_site(self) -> Result<Site> {
    Ok(Site {
      id:          self.id,
      client_id:   self.client_id,
      contract_id: self.contract_id,
      name:        self.name,
      location:    self.location,
      start_date:  decode_date(&self.start_date)?,
      end_date:    decode_date_opt(self.end_date.as_deref())?,
      status:      decode_site_status(&self.status)?,
    })
  }
}

/// Raw strings read directly from a `site_contracts` row.
pub struct RawContract {
  pub id:         i64,
  pub client_id:  i64,
  pub name:       String,
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
  pub file_path:  Option<String>,
  pub sha256:     Option<String>,
  pub created_at: Option<String>,
}

impl RawContract {
  pub fn into_contract(self) -> Result<SiteContract> {
    Ok(SiteContract {
      id:         self.id,
      client_id:  self.client_id,
      name:       self.name,
      start_date: decode_date_opt(self.start_date.as_deref())?,
      end_date:   decode_date_opt(self.end_date.as_deref())?,
      file_path:  self.file_path,
      sha256:     self.sha256,
      created_at: decode_dt_opt(self.created_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `workers` row.
pub struct RawWorker {
  pub id:                 i64,
  pub natural_id:         String,
  pub given_names:        String,
  pub family_names:       String,
  pub job_title:          String,
  pub cost_center:        Option<String>,
  pub email:              Option<String>,
  pub hired_at:           Option<String>,
  pub medical_exam_until: Option<String>,
}

impl RawWorker {
  pub fn into_worker(self) -> Result<Worker> {
    Ok(Worker {
      id:                 self.id,
      natural_id:         self.natural_id,
      given_names:        self.given_names,
      family_names:       self.family_names,
      job_title:          self.job_title,
      cost_center:        self.cost_center,
      email:              self.email,
      hired_at:           decode_date_opt(self.hired_at.as_deref())?,
      medical_exam_until: decode_date_opt(
        self.medical_exam_until.as_deref(),
      )?,
    })
  }
}

/// Raw strings read directly from an `assignments` row.
pub struct RawAssignment {
  pub id:             i64,
  pub site_id:        i64,
  pub worker_id:      i64,
  pub site_job_title: String,
  pub entry_date:     String,
  pub exit_date:      Option<String>,
  pub status:         String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      id:             self.id,
      site_id:        self.site_id,
      worker_id:      self.worker_id,
      site_job_title: self.site_job_title,
      entry_date:     decode_date(&self.entry_date)?,
      exit_date:      decode_date_opt(self.exit_date.as_deref())?,
      status:         decode_assignment_status(&self.status)?,
    })
  }
}

/// Raw strings shared by the three uploaded-document tables; `site_id` /
/// `worker_id` are populated per table.
pub struct RawDocument {
  pub id:         i64,
  pub owner_id:   i64,
  pub doc_type:   String,
  pub file_name:  String,
  pub file_path:  String,
  pub sha256:     String,
  pub created_at: String,
}

impl RawDocument {
  pub fn into_worker_document(self) -> Result<WorkerDocument> {
    Ok(WorkerDocument {
      id:         self.id,
      worker_id:  self.owner_id,
      doc_type:   self.doc_type,
      file_name:  self.file_name,
      file_path:  self.file_path,
      sha256:     self.sha256,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_company_document(self) -> Result<CompanyDocument> {
    Ok(CompanyDocument {
      id:         self.id,
      doc_type:   self.doc_type,
      file_name:  self.file_name,
      file_path:  self.file_path,
      sha256:     self.sha256,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_site_company_document(self) -> Result<SiteCompanyDocument> {
    Ok(SiteCompanyDocument {
      id:         self.id,
      site_id:    self.owner_id,
      doc_type:   self.doc_type,
      file_name:  self.file_name,
      file_path:  self.file_path,
      sha256:     self.sha256,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `site_annexes` row.
pub struct RawAnnex {
  pub id:         i64,
  pub site_id:    i64,
  pub name:       String,
  pub file_path:  String,
  pub sha256:     String,
  pub created_at: String,
}

impl RawAnnex {
  pub fn into_annex(self) -> Result<Annex> {
    Ok(Annex {
      id:         self.id,
      site_id:    self.site_id,
      name:       self.name,
      file_path:  self.file_path,
      sha256:     self.sha256,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `export_history` row.
pub struct RawExport {
  pub id:         i64,
  pub site_id:    i64,
  pub file_path:  String,
  pub sha256:     String,
  pub size_bytes: i64,
  pub created_at: String,
}

impl RawExport {
  pub fn into_export(self) -> Result<ExportRecord> {
    Ok(ExportRecord {
      id:         self.id,
      site_id:    self.site_id,
      file_path:  self.file_path,
      sha256:     self.sha256,
      size_bytes: self.size_bytes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `export_history_monthly` row.
pub struct RawMonthlyExport {
  pub id:         i64,
  pub year_month: String,
  pub file_path:  String,
  pub sha256:     Option<String>,
  pub size_bytes: Option<i64>,
  pub created_at: String,
}

impl RawMonthlyExport {
  pub fn into_export(self) -> Result<MonthlyExportRecord> {
    Ok(MonthlyExportRecord {
      id:         self.id,
      year_month: self.year_month,
      file_path:  self.file_path,
      sha256:     self.sha256,
      size_bytes: self.size_bytes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `auto_backup_history` row.
pub struct RawAutoBackup {
  pub id:         i64,
  pub tag:        Option<String>,
  pub file_path:  String,
  pub sha256:     String,
  pub size_bytes: i64,
  pub created_at: String,
}

impl RawAutoBackup {
  pub fn into_record(self) -> Result<AutoBackupRecord> {
    Ok(AutoBackupRecord {
      id:         self.id,
      tag:        self.tag,
      file_path:  self.file_path,
      sha256:     self.sha256,
      size_bytes: self.size_bytes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
