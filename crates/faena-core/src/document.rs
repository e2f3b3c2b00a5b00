//! Uploaded compliance documents.
//!
//! `doc_type` is an open string everywhere; only the fixed catalogs in
//! [`crate::catalog`] participate in coverage arithmetic. A worker may hold
//! several documents of one type (e.g. a renewed contract annex per year);
//! presence of any upload of a required type satisfies that requirement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document uploaded for one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerDocument {
  pub id:         i64,
  pub worker_id:  i64,
  pub doc_type:   String,
  pub file_name:  String,
  pub file_path:  String,
  pub sha256:     String,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::SiteStore::add_worker_document`].
#[derive(Debug, Clone)]
pub struct NewWorkerDocument {
  pub worker_id: i64,
  pub doc_type:  String,
  pub file_name: String,
  pub file_path: String,
  pub sha256:    String,
}

/// A company-level document that applies to every site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDocument {
  pub id:         i64,
  pub doc_type:   String,
  pub file_name:  String,
  pub file_path:  String,
  pub sha256:     String,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::SiteStore::add_company_document`].
#[derive(Debug, Clone)]
pub struct NewCompanyDocument {
  pub doc_type:  String,
  pub file_name: String,
  pub file_path: String,
  pub sha256:    String,
}

/// A company-level document scoped to a single site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCompanyDocument {
  pub id:         i64,
  pub site_id:    i64,
  pub doc_type:   String,
  pub file_name:  String,
  pub file_path:  String,
  pub sha256:     String,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::SiteStore::add_site_company_document`].
#[derive(Debug, Clone)]
pub struct NewSiteCompanyDocument {
  pub site_id:   i64,
  pub doc_type:  String,
  pub file_name: String,
  pub file_path: String,
  pub sha256:    String,
}
