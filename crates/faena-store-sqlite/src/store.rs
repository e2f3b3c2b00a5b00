//! [`SqliteStore`] — the SQLite implementation of [`SiteStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use faena_core::{
  catalog::REQUIRED_WORKER_DOCS,
  document::{
    CompanyDocument, NewCompanyDocument, NewSiteCompanyDocument,
    NewWorkerDocument, SiteCompanyDocument, WorkerDocument,
  },
  history::{
    AutoBackupRecord, ExportRecord, MonthlyExportRecord, NewAutoBackupRecord,
    NewExportRecord, NewMonthlyExportRecord,
  },
  site::{Annex, Client, NewAnnex, NewContract, NewSite, Site, SiteContract},
  store::{RequiredPresence, SiteHeader, SiteOverview, SiteStore},
  worker::{Assignment, NewAssignment, NewWorker, Worker},
};

use crate::{
  encode::{
    RawAnnex, RawAssignment, RawAutoBackup, RawContract, RawDocument,
    RawExport, RawMonthlyExport, RawSite, RawWorker, encode_assignment_status,
    encode_date, encode_dt, encode_site_status,
  },
  schema::{RECONCILE_COLUMNS, SCHEMA},
  Error, Result,
};

// ─── Row readers ─────────────────────────────────────────────────────────────

fn raw_site(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSite> {
  Ok(RawSite {
    id:          row.get(0)?,
    client_id:   row.get(1)?,
    contract_id: row.get(2)?,
    name:        row.get(3)?,
    location:    row.get(4)?,
    start_date:  row.get(5)?,
    end_date:    row.get(6)?,
    status:      row.get(7)?,
  })
}

fn raw_worker(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawWorker> {
  Ok(RawWorker {
    id:                 row.get(0)?,
    natural_id:         row.get(1)?,
    given_names:        row.get(2)?,
    family_names:       row.get(3)?,
    job_title:          row.get(4)?,
    cost_center:        row.get(5)?,
    email:              row.get(6)?,
    hired_at:           row.get(7)?,
    medical_exam_until: row.get(8)?,
  })
}

fn raw_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDocument> {
  Ok(RawDocument {
    id:         row.get(0)?,
    owner_id:   row.get(1)?,
    doc_type:   row.get(2)?,
    file_name:  row.get(3)?,
    file_path:  row.get(4)?,
    sha256:     row.get(5)?,
    created_at: row.get(6)?,
  })
}

const SITE_COLUMNS: &str = "s.id, s.client_id, s.contract_id, s.name, \
                            s.location, s.start_date, s.end_date, s.status";

const WORKER_COLUMNS: &str = "w.id, w.natural_id, w.given_names, \
                              w.family_names, w.job_title, w.cost_center, \
                              w.email, w.hired_at, w.medical_exam_until";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Faena store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone, Debug)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, run the base DDL, and reconcile
  /// late-added columns.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;

        // Forward-only additive reconcile: add any column this version
        // knows about that the database file predates.
        for (table, column, col_type) in RECONCILE_COLUMNS {
          let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
          let existing = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          if !existing.iter().any(|c| c == column) {
            debug!(table, column, "adding missing column");
            conn.execute_batch(&format!(
              "ALTER TABLE {table} ADD COLUMN {column} {col_type};"
            ))?;
          }
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Flush the WAL into the main database file so a file-level copy sees
  /// every committed write. Called by the backup path before it reads the
  /// database bytes.
  pub async fn checkpoint(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SiteStore impl ──────────────────────────────────────────────────────────

impl SiteStore for SqliteStore {
  type Error = Error;

  // ── Clients & contracts ───────────────────────────────────────────────────

  async fn add_client(&self, name: &str) -> Result<Client> {
    let name = name.to_owned();
    let (id, name) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO clients (name) VALUES (?1)",
          rusqlite::params![name],
        )?;
        Ok((conn.last_insert_rowid(), name))
      })
      .await?;
    Ok(Client { id, name })
  }

  async fn list_clients(&self) -> Result<Vec<Client>> {
    let clients = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, name FROM clients ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Client { id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(clients)
  }

  async fn add_contract(&self, input: NewContract) -> Result<SiteContract> {
    let created_at = Utc::now();
    let created_at_str = encode_dt(created_at);
    let start_str = input.start_date.map(encode_date);
    let end_str = input.end_date.map(encode_date);
    let NewContract { client_id, name, file_path, sha256, .. } = input;

    let raw: RawContract = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO site_contracts
             (client_id, name, start_date, end_date, file_path, sha256,
              created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            client_id,
            name,
            start_str,
            end_str,
            file_path,
            sha256,
            created_at_str,
          ],
        )?;
        Ok(RawContract {
          id: conn.last_insert_rowid(),
          client_id,
          name,
          start_date: start_str,
          end_date: end_str,
          file_path,
          sha256,
          created_at: Some(created_at_str),
        })
      })
      .await?;
    raw.into_contract()
  }

  async fn delete_contract(&self, id: i64) -> Result<()> {
    let deleted = self
      .conn
      .call(move |conn| {
        // ON DELETE SET NULL detaches dependent sites.
        let n = conn.execute(
          "DELETE FROM site_contracts WHERE id = ?1",
          rusqlite::params![id],
        )?;
        Ok(n)
      })
      .await?;
    if deleted == 0 {
      return Err(Error::Core(faena_core::Error::ContractNotFound(id)));
    }
    Ok(())
  }

  // ── Sites ─────────────────────────────────────────────────────────────────

  async fn add_site(&self, input: NewSite) -> Result<Site> {
    input.validate_dates()?;

    let start_str = encode_date(input.start_date);
    let end_str = input.end_date.map(encode_date);
    let status_str = encode_site_status(input.status).to_owned();
    let NewSite { client_id, contract_id, name, location, .. } = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sites
             (client_id, contract_id, name, location, start_date, end_date,
              status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            client_id,
            contract_id,
            name,
            location,
            start_str,
            end_str,
            status_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Site {
      id,
      client_id:   input.client_id,
      contract_id: input.contract_id,
      name:        input.name,
      location:    input.location,
      start_date:  input.start_date,
      end_date:    input.end_date,
      status:      input.status,
    })
  }

  async fn get_site(&self, id: i64) -> Result<Option<Site>> {
    let raw: Option<RawSite> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SITE_COLUMNS} FROM sites s WHERE s.id = ?1"),
              rusqlite::params![id],
              raw_site,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSite::into_site).transpose()
  }

  async fn site_header(&self, id: i64) -> Result<Option<SiteHeader>> {
    let raw: Option<(RawSite, String, Option<String>, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SITE_COLUMNS}, c.name, sc.name, sc.file_path
                 FROM sites s
                 JOIN clients c ON c.id = s.client_id
                 LEFT JOIN site_contracts sc ON sc.id = s.contract_id
                 WHERE s.id = ?1"
              ),
              rusqlite::params![id],
              |row| {
                Ok((raw_site(row)?, row.get(8)?, row.get(9)?, row.get(10)?))
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(site, client_name, contract_name, contract_path)| {
        Ok(SiteHeader {
          site: site.into_site()?,
          client_name,
          contract_name,
          contract_path,
        })
      })
      .transpose()
  }

  async fn list_sites(&self) -> Result<Vec<SiteOverview>> {
    let raws: Vec<(RawSite, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SITE_COLUMNS}, c.name
           FROM sites s
           JOIN clients c ON c.id = s.client_id
           ORDER BY s.id DESC"
        ))?;
        let rows = stmt
          .query_map([], |row| Ok((raw_site(row)?, row.get(8)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(site, client_name)| {
        Ok(SiteOverview { site: site.into_site()?, client_name })
      })
      .collect()
  }

  async fn sites_started_in(
    &self,
    year_month: &str,
  ) -> Result<Vec<SiteOverview>> {
    let ym = year_month.to_owned();
    let raws: Vec<(RawSite, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SITE_COLUMNS}, c.name
           FROM sites s
           JOIN clients c ON c.id = s.client_id
           WHERE substr(s.start_date, 1, 7) = ?1
           ORDER BY s.id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![ym], |row| {
            Ok((raw_site(row)?, row.get(8)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(site, client_name)| {
        Ok(SiteOverview { site: site.into_site()?, client_name })
      })
      .collect()
  }

  async fn add_annex(&self, input: NewAnnex) -> Result<Annex> {
    let created_at = Utc::now();
    let created_at_str = encode_dt(created_at);
    let NewAnnex { site_id, name, file_path, sha256 } = input;

    let raw: RawAnnex = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO site_annexes
             (site_id, name, file_path, sha256, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![site_id, name, file_path, sha256, created_at_str],
        )?;
        Ok(RawAnnex {
          id: conn.last_insert_rowid(),
          site_id,
          name,
          file_path,
          sha256,
          created_at: created_at_str,
        })
      })
      .await?;
    raw.into_annex()
  }

  async fn annexes(&self, site_id: i64) -> Result<Vec<Annex>> {
    let raws: Vec<RawAnnex> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, site_id, name, file_path, sha256, created_at
           FROM site_annexes WHERE site_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![site_id], |row| {
            Ok(RawAnnex {
              id:         row.get(0)?,
              site_id:    row.get(1)?,
              name:       row.get(2)?,
              file_path:  row.get(3)?,
              sha256:     row.get(4)?,
              created_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAnnex::into_annex).collect()
  }

  // ── Workers & assignments ─────────────────────────────────────────────────

  async fn add_worker(&self, input: NewWorker) -> Result<Worker> {
    let hired_str = input.hired_at.map(encode_date);
    let exam_str = input.medical_exam_until.map(encode_date);
    let NewWorker {
      natural_id,
      given_names,
      family_names,
      job_title,
      cost_center,
      email,
      ..
    } = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO workers
             (natural_id, given_names, family_names, job_title, cost_center,
              email, hired_at, medical_exam_until)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            natural_id,
            given_names,
            family_names,
            job_title,
            cost_center,
            email,
            hired_str,
            exam_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Worker {
      id,
      natural_id:         input.natural_id,
      given_names:        input.given_names,
      family_names:       input.family_names,
      job_title:          input.job_title,
      cost_center:        input.cost_center,
      email:              input.email,
      hired_at:           input.hired_at,
      medical_exam_until: input.medical_exam_until,
    })
  }

  async fn find_worker(&self, natural_id: &str) -> Result<Option<Worker>> {
    let natural_id = natural_id.to_owned();
    let raw: Option<RawWorker> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {WORKER_COLUMNS} FROM workers w
                 WHERE w.natural_id = ?1"
              ),
              rusqlite::params![natural_id],
              raw_worker,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawWorker::into_worker).transpose()
  }

  async fn assign_worker(&self, input: NewAssignment) -> Result<Assignment> {
    let entry_str = encode_date(input.entry_date);
    let exit_str = input.exit_date.map(encode_date);
    let status_str = encode_assignment_status(input.status).to_owned();
    let NewAssignment { site_id, worker_id, site_job_title, .. } =
      input.clone();

    let raw: RawAssignment = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assignments
             (site_id, worker_id, site_job_title, entry_date, exit_date,
              status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            site_id,
            worker_id,
            site_job_title,
            entry_str,
            exit_str,
            status_str,
          ],
        )?;
        Ok(RawAssignment {
          id: conn.last_insert_rowid(),
          site_id,
          worker_id,
          site_job_title,
          entry_date: entry_str,
          exit_date: exit_str,
          status: status_str,
        })
      })
      .await?;
    raw.into_assignment()
  }

  async fn assigned_workers(&self, site_id: i64) -> Result<Vec<Worker>> {
    let raws: Vec<RawWorker> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {WORKER_COLUMNS}
           FROM assignments a
           JOIN workers w ON w.id = a.worker_id
           WHERE a.site_id = ?1
           ORDER BY w.family_names, w.given_names"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![site_id], raw_worker)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawWorker::into_worker).collect()
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn add_worker_document(
    &self,
    input: NewWorkerDocument,
  ) -> Result<WorkerDocument> {
    let created_at_str = encode_dt(Utc::now());
    let NewWorkerDocument { worker_id, doc_type, file_name, file_path, sha256 } =
      input;

    let raw: RawDocument = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO worker_documents
             (worker_id, doc_type, file_name, file_path, sha256, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            worker_id,
            doc_type,
            file_name,
            file_path,
            sha256,
            created_at_str,
          ],
        )?;
        Ok(RawDocument {
          id: conn.last_insert_rowid(),
          owner_id: worker_id,
          doc_type,
          file_name,
          file_path,
          sha256,
          created_at: created_at_str,
        })
      })
      .await?;
    raw.into_worker_document()
  }

  async fn worker_documents(
    &self,
    worker_id: i64,
  ) -> Result<Vec<WorkerDocument>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, worker_id, doc_type, file_name, file_path, sha256,
                  created_at
           FROM worker_documents WHERE worker_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![worker_id], raw_document)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDocument::into_worker_document).collect()
  }

  async fn add_company_document(
    &self,
    input: NewCompanyDocument,
  ) -> Result<CompanyDocument> {
    let created_at_str = encode_dt(Utc::now());
    let NewCompanyDocument { doc_type, file_name, file_path, sha256 } = input;

    let raw: RawDocument = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO company_documents
             (doc_type, file_name, file_path, sha256, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            doc_type,
            file_name,
            file_path,
            sha256,
            created_at_str,
          ],
        )?;
        Ok(RawDocument {
          id: conn.last_insert_rowid(),
          owner_id: 0,
          doc_type,
          file_name,
          file_path,
          sha256,
          created_at: created_at_str,
        })
      })
      .await?;
    raw.into_company_document()
  }

  async fn company_documents(&self) -> Result<Vec<CompanyDocument>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, 0, doc_type, file_name, file_path, sha256, created_at
           FROM company_documents ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], raw_document)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDocument::into_company_document).collect()
  }

  async fn add_site_company_document(
    &self,
    input: NewSiteCompanyDocument,
  ) -> Result<SiteCompanyDocument> {
    let created_at_str = encode_dt(Utc::now());
    let NewSiteCompanyDocument {
      site_id,
      doc_type,
      file_name,
      file_path,
      sha256,
    } = input;

    let raw: RawDocument = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO site_company_documents
             (site_id, doc_type, file_name, file_path, sha256, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            site_id,
            doc_type,
            file_name,
            file_path,
            sha256,
            created_at_str,
          ],
        )?;
        Ok(RawDocument {
          id: conn.last_insert_rowid(),
          owner_id: site_id,
          doc_type,
          file_name,
          file_path,
          sha256,
          created_at: created_at_str,
        })
      })
      .await?;
    raw.into_site_company_document()
  }

  async fn site_company_documents(
    &self,
    site_id: i64,
  ) -> Result<Vec<SiteCompanyDocument>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, site_id, doc_type, file_name, file_path, sha256,
                  created_at
           FROM site_company_documents WHERE site_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![site_id], raw_document)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawDocument::into_site_company_document)
      .collect()
  }

  async fn site_company_document_types(
    &self,
    site_id: i64,
  ) -> Result<Vec<String>> {
    let types = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT doc_type FROM site_company_documents
           WHERE site_id = ?1 ORDER BY doc_type",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![site_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(types)
  }

  // ── Compliance aggregates ─────────────────────────────────────────────────

  async fn required_presence(&self) -> Result<Vec<RequiredPresence>> {
    let stats = self
      .conn
      .call(|conn| {
        let placeholders =
          vec!["?"; REQUIRED_WORKER_DOCS.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT a.site_id, a.worker_id,
                  COUNT(DISTINCT CASE WHEN d.doc_type IN ({placeholders})
                                      THEN d.doc_type END)
           FROM assignments a
           LEFT JOIN worker_documents d ON d.worker_id = a.worker_id
           GROUP BY a.site_id, a.worker_id"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(REQUIRED_WORKER_DOCS.iter()),
            |row| {
              Ok(RequiredPresence {
                site_id:   row.get(0)?,
                worker_id: row.get(1)?,
                present:   row.get(2)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(stats)
  }

  // ── Artifact history ──────────────────────────────────────────────────────

  async fn record_export(&self, input: NewExportRecord) -> Result<ExportRecord> {
    let created_at_str = encode_dt(Utc::now());
    let NewExportRecord { site_id, file_path, sha256, size_bytes } = input;

    let raw: RawExport = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO export_history
             (site_id, file_path, sha256, size_bytes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            site_id,
            file_path,
            sha256,
            size_bytes,
            created_at_str,
          ],
        )?;
        Ok(RawExport {
          id: conn.last_insert_rowid(),
          site_id,
          file_path,
          sha256,
          size_bytes,
          created_at: created_at_str,
        })
      })
      .await?;
    raw.into_export()
  }

  async fn record_monthly_export(
    &self,
    input: NewMonthlyExportRecord,
  ) -> Result<MonthlyExportRecord> {
    let created_at_str = encode_dt(Utc::now());
    let NewMonthlyExportRecord { year_month, file_path, sha256, size_bytes } =
      input;

    let raw: RawMonthlyExport = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO export_history_monthly
             (year_month, file_path, sha256, size_bytes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            year_month,
            file_path,
            sha256,
            size_bytes,
            created_at_str,
          ],
        )?;
        Ok(RawMonthlyExport {
          id: conn.last_insert_rowid(),
          year_month,
          file_path,
          sha256,
          size_bytes,
          created_at: created_at_str,
        })
      })
      .await?;
    raw.into_export()
  }

  async fn record_auto_backup(
    &self,
    input: NewAutoBackupRecord,
  ) -> Result<AutoBackupRecord> {
    let created_at_str = encode_dt(Utc::now());
    let NewAutoBackupRecord { tag, file_path, sha256, size_bytes } = input;

    let raw: RawAutoBackup = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO auto_backup_history
             (tag, file_path, sha256, size_bytes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![tag, file_path, sha256, size_bytes, created_at_str],
        )?;
        Ok(RawAutoBackup {
          id: conn.last_insert_rowid(),
          tag,
          file_path,
          sha256,
          size_bytes,
          created_at: created_at_str,
        })
      })
      .await?;
    raw.into_record()
  }

  async fn auto_backups(&self) -> Result<Vec<AutoBackupRecord>> {
    let raws: Vec<RawAutoBackup> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, tag, file_path, sha256, size_bytes, created_at
           FROM auto_backup_history ORDER BY id DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAutoBackup {
              id:         row.get(0)?,
              tag:        row.get(1)?,
              file_path:  row.get(2)?,
              sha256:     row.get(3)?,
              size_bytes: row.get(4)?,
              created_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAutoBackup::into_record).collect()
  }

  async fn delete_auto_backups(&self, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
      return Ok(());
    }
    let ids = ids.to_vec();
    self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; ids.len()].join(", ");
        conn.execute(
          &format!(
            "DELETE FROM auto_backup_history WHERE id IN ({placeholders})"
          ),
          rusqlite::params_from_iter(ids.iter()),
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
