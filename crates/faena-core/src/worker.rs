//! Workers and their site assignments.
//!
//! A worker's lifecycle is independent of any site: the record (and every
//! document ever uploaded for it) persists across assignments, so a worker
//! reused on a new site keeps their evidence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::integrity::worker_folder;

/// A person who can be assigned to sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
  pub id:                 i64,
  /// National identifier (RUT); unique across the store.
  pub natural_id:         String,
  pub given_names:        String,
  pub family_names:       String,
  pub job_title:          String,
  pub cost_center:        Option<String>,
  pub email:              Option<String>,
  pub hired_at:           Option<NaiveDate>,
  /// Expiry of the pre-occupational medical exam. Tracked for listings
  /// only; coverage arithmetic never consults it.
  pub medical_exam_until: Option<NaiveDate>,
}

impl Worker {
  /// Display label used in pending-document listings and manifests.
  pub fn label(&self) -> String {
    format!("{} {} ({})", self.family_names, self.given_names, self.natural_id)
  }

  /// Sanitized archive folder name for this worker's documents.
  pub fn folder(&self) -> String {
    worker_folder(&self.family_names, &self.given_names, &self.natural_id)
  }
}

/// Input for [`crate::store::SiteStore::add_worker`].
#[derive(Debug, Clone)]
pub struct NewWorker {
  pub natural_id:         String,
  pub given_names:        String,
  pub family_names:       String,
  pub job_title:          String,
  pub cost_center:        Option<String>,
  pub email:              Option<String>,
  pub hired_at:           Option<NaiveDate>,
  pub medical_exam_until: Option<NaiveDate>,
}

/// Lifecycle status of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssignmentStatus {
  Active,
  Closed,
}

/// The link between one worker and one site for a bounded period.
/// Unique per (site, worker) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub id:             i64,
  pub site_id:        i64,
  pub worker_id:      i64,
  pub site_job_title: String,
  pub entry_date:     NaiveDate,
  pub exit_date:      Option<NaiveDate>,
  pub status:         AssignmentStatus,
}

/// Input for [`crate::store::SiteStore::assign_worker`].
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub site_id:        i64,
  pub worker_id:      i64,
  pub site_job_title: String,
  pub entry_date:     NaiveDate,
  pub exit_date:      Option<NaiveDate>,
  pub status:         AssignmentStatus,
}
