//! The `SiteStore` trait and supporting read-model types.
//!
//! The trait is implemented by storage backends (e.g.
//! `faena-store-sqlite`). Higher layers (`faena-compliance`,
//! `faena-export`, `faena-cli`) depend on this abstraction, not on any
//! concrete backend. The backup path is the one deliberate exception: it
//! replaces the backend's on-disk state wholesale and is therefore tied to
//! the concrete store.

use crate::{
  document::{
    CompanyDocument, NewCompanyDocument, NewSiteCompanyDocument,
    NewWorkerDocument, SiteCompanyDocument, WorkerDocument,
  },
  history::{
    AutoBackupRecord, ExportRecord, MonthlyExportRecord, NewAutoBackupRecord,
    NewExportRecord, NewMonthlyExportRecord,
  },
  site::{Annex, Client, NewAnnex, NewContract, NewSite, Site, SiteContract},
  worker::{Assignment, NewAssignment, NewWorker, Worker},
};

// ─── Read-model types ────────────────────────────────────────────────────────

/// A site together with its client's display name; one listing row.
#[derive(Debug, Clone)]
pub struct SiteOverview {
  pub site:        Site,
  pub client_name: String,
}

/// Everything an export manifest header needs about one site.
#[derive(Debug, Clone)]
pub struct SiteHeader {
  pub site:          Site,
  pub client_name:   String,
  pub contract_name: Option<String>,
  pub contract_path: Option<String>,
}

/// How many *distinct required* worker document types are on file for one
/// (site, worker) assignment pair. Free-form types are not counted.
#[derive(Debug, Clone, Copy)]
pub struct RequiredPresence {
  pub site_id:   i64,
  pub worker_id: i64,
  pub present:   i64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Faena persistence backend.
///
/// History writes (`record_export`, `record_monthly_export`,
/// `record_auto_backup`) are append-only; the only deletion the trait
/// exposes is retention pruning of auto-backup rows and contract removal
/// (which nulls site references, never cascading into sites).
pub trait SiteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Clients & contracts ───────────────────────────────────────────────

  /// Create a client. The display name is unique store-wide.
  async fn add_client(&self, name: &str) -> Result<Client, Self::Error>;

  async fn list_clients(&self) -> Result<Vec<Client>, Self::Error>;

  async fn add_contract(
    &self,
    input: NewContract,
  ) -> Result<SiteContract, Self::Error>;

  /// Delete a contract. Sites referencing it keep existing with a nulled
  /// contract reference.
  async fn delete_contract(&self, id: i64) -> Result<(), Self::Error>;

  // ── Sites ─────────────────────────────────────────────────────────────

  /// Persist a new site after checking its date invariants.
  async fn add_site(&self, input: NewSite) -> Result<Site, Self::Error>;

  async fn get_site(&self, id: i64) -> Result<Option<Site>, Self::Error>;

  /// Site plus client name plus contract name/file, for manifests.
  /// Returns `None` if the site does not exist.
  async fn site_header(
    &self,
    id: i64,
  ) -> Result<Option<SiteHeader>, Self::Error>;

  /// All sites with client names, newest site first.
  async fn list_sites(&self) -> Result<Vec<SiteOverview>, Self::Error>;

  /// Sites whose start date falls in `year_month` (`YYYY-MM`), newest
  /// first.
  async fn sites_started_in(
    &self,
    year_month: &str,
  ) -> Result<Vec<SiteOverview>, Self::Error>;

  async fn add_annex(&self, input: NewAnnex) -> Result<Annex, Self::Error>;

  async fn annexes(&self, site_id: i64) -> Result<Vec<Annex>, Self::Error>;

  // ── Workers & assignments ─────────────────────────────────────────────

  async fn add_worker(&self, input: NewWorker)
  -> Result<Worker, Self::Error>;

  /// Look a worker up by national identifier.
  async fn find_worker(
    &self,
    natural_id: &str,
  ) -> Result<Option<Worker>, Self::Error>;

  /// Link a worker to a site. At most one assignment exists per
  /// (site, worker) pair.
  async fn assign_worker(
    &self,
    input: NewAssignment,
  ) -> Result<Assignment, Self::Error>;

  /// Workers assigned to a site — any assignment status — ordered by
  /// family then given names. This is the compliance scope for the site.
  async fn assigned_workers(
    &self,
    site_id: i64,
  ) -> Result<Vec<Worker>, Self::Error>;

  // ── Documents ─────────────────────────────────────────────────────────

  async fn add_worker_document(
    &self,
    input: NewWorkerDocument,
  ) -> Result<WorkerDocument, Self::Error>;

  /// All documents ever uploaded for one worker, oldest first.
  async fn worker_documents(
    &self,
    worker_id: i64,
  ) -> Result<Vec<WorkerDocument>, Self::Error>;

  async fn add_company_document(
    &self,
    input: NewCompanyDocument,
  ) -> Result<CompanyDocument, Self::Error>;

  /// Global company documents, oldest first.
  async fn company_documents(&self)
  -> Result<Vec<CompanyDocument>, Self::Error>;

  async fn add_site_company_document(
    &self,
    input: NewSiteCompanyDocument,
  ) -> Result<SiteCompanyDocument, Self::Error>;

  /// Per-site company documents, oldest first.
  async fn site_company_documents(
    &self,
    site_id: i64,
  ) -> Result<Vec<SiteCompanyDocument>, Self::Error>;

  /// Distinct document types present among a site's company documents.
  async fn site_company_document_types(
    &self,
    site_id: i64,
  ) -> Result<Vec<String>, Self::Error>;

  // ── Compliance aggregates ─────────────────────────────────────────────

  /// One row per assignment with the count of distinct required worker
  /// document types on file. The basis of the progress table.
  async fn required_presence(
    &self,
  ) -> Result<Vec<RequiredPresence>, Self::Error>;

  // ── Artifact history ──────────────────────────────────────────────────

  async fn record_export(
    &self,
    input: NewExportRecord,
  ) -> Result<ExportRecord, Self::Error>;

  async fn record_monthly_export(
    &self,
    input: NewMonthlyExportRecord,
  ) -> Result<MonthlyExportRecord, Self::Error>;

  async fn record_auto_backup(
    &self,
    input: NewAutoBackupRecord,
  ) -> Result<AutoBackupRecord, Self::Error>;

  /// Auto-backup rows, newest first. Retention keeps a prefix of this.
  async fn auto_backups(&self)
  -> Result<Vec<AutoBackupRecord>, Self::Error>;

  /// Remove auto-backup rows by id; part of retention pruning.
  async fn delete_auto_backups(&self, ids: &[i64])
  -> Result<(), Self::Error>;
}
