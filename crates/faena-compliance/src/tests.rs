//! Engine tests against an in-memory SQLite store.

use std::sync::Arc;

use chrono::NaiveDate;
use faena_core::{
  catalog::{REQUIRED_COMPANY_DOCS, REQUIRED_WORKER_DOCS},
  document::{NewSiteCompanyDocument, NewWorkerDocument},
  site::{NewSite, SiteStatus},
  store::SiteStore,
  worker::{AssignmentStatus, NewAssignment, NewWorker},
};
use faena_store_sqlite::SqliteStore;

use crate::{ComplianceEngine, Semaphore, SiteProgressRow, semaphore};

async fn engine() -> (Arc<SqliteStore>, ComplianceEngine<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  (store.clone(), ComplianceEngine::new(store))
}

fn date(s: &str) -> NaiveDate {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn seed_site(store: &SqliteStore) -> i64 {
  let client = store.add_client("Minera Andes").await.unwrap();
  store
    .add_site(NewSite {
      client_id:   client.id,
      contract_id: None,
      name:        "Planta Norte".into(),
      location:    "Antofagasta".into(),
      start_date:  date("2025-03-01"),
      end_date:    None,
      status:      SiteStatus::Active,
    })
    .await
    .unwrap()
    .id
}

async fn seed_worker(
  store: &SqliteStore,
  site_id: i64,
  natural_id: &str,
  family: &str,
  doc_types: &[&str],
) -> i64 {
  let worker = store
    .add_worker(NewWorker {
      natural_id:         natural_id.into(),
      given_names:        "Juan".into(),
      family_names:       family.into(),
      job_title:          String::new(),
      cost_center:        None,
      email:              None,
      hired_at:           None,
      medical_exam_until: None,
    })
    .await
    .unwrap();
  store
    .assign_worker(NewAssignment {
      site_id,
      worker_id: worker.id,
      site_job_title: String::new(),
      entry_date: date("2025-03-01"),
      exit_date: None,
      status: AssignmentStatus::Active,
    })
    .await
    .unwrap();
  for doc_type in doc_types {
    store
      .add_worker_document(NewWorkerDocument {
        worker_id: worker.id,
        doc_type:  (*doc_type).into(),
        file_name: "doc.pdf".into(),
        file_path: "/nonexistent/doc.pdf".into(),
        sha256:    "0".repeat(64),
      })
      .await
      .unwrap();
  }
  worker.id
}

fn row(workers: i64, coverage: f64, missing: i64) -> SiteProgressRow {
  SiteProgressRow {
    site_id: 1,
    name: "x".into(),
    status: SiteStatus::Active,
    start_date: date("2025-03-01"),
    end_date: None,
    client: "c".into(),
    workers,
    workers_ok: 0,
    coverage_pct: coverage,
    missing_total: missing,
  }
}

// ─── Missing documents ───────────────────────────────────────────────────────

#[tokio::test]
async fn no_workers_means_empty_pending_list() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;

  let pending = engine.missing_worker_documents(site_id).await.unwrap();
  assert!(pending.is_empty());
}

#[tokio::test]
async fn unknown_site_is_an_error() {
  let (_store, engine) = engine().await;
  let err = engine.missing_worker_documents(404).await.unwrap_err();
  assert!(matches!(err, crate::Error::SiteNotFound(404)));
}

#[tokio::test]
async fn missing_lists_preserve_catalog_order() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;
  seed_worker(&store, site_id, "1-9", "Pérez", &["IRL", "REGISTRO_EPP"])
    .await;

  let pending = engine.missing_worker_documents(site_id).await.unwrap();
  assert_eq!(pending.len(), 1);
  let expected: Vec<&str> = REQUIRED_WORKER_DOCS
    .iter()
    .copied()
    .filter(|t| *t != "IRL" && *t != "REGISTRO_EPP")
    .collect();
  assert_eq!(pending[0].missing, expected);
}

#[tokio::test]
async fn fully_compliant_worker_has_empty_missing_list() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;
  seed_worker(&store, site_id, "1-9", "Pérez", REQUIRED_WORKER_DOCS).await;

  let pending = engine.missing_worker_documents(site_id).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert!(pending[0].missing.is_empty());
}

#[tokio::test]
async fn free_form_types_do_not_satisfy_requirements() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;
  seed_worker(&store, site_id, "1-9", "Pérez", &["OTROS", "CHARLA_DIARIA"])
    .await;

  let pending = engine.missing_worker_documents(site_id).await.unwrap();
  assert_eq!(pending[0].missing, REQUIRED_WORKER_DOCS);
}

#[tokio::test]
async fn company_documents_checked_against_catalog() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;

  let missing = engine.missing_company_documents(site_id).await.unwrap();
  assert_eq!(missing, REQUIRED_COMPANY_DOCS);

  store
    .add_site_company_document(NewSiteCompanyDocument {
      site_id,
      doc_type:  "CERTIFICADO_CUMPLIMIENTO_LABORAL".into(),
      file_name: "cert.pdf".into(),
      file_path: "/nonexistent/cert.pdf".into(),
      sha256:    "0".repeat(64),
    })
    .await
    .unwrap();

  let missing = engine.missing_company_documents(site_id).await.unwrap();
  assert_eq!(missing, ["CERTIFICADO_ACCIDENTABILIDAD"]);
}

// ─── Progress table ──────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_with_no_sites_is_empty() {
  let (_store, engine) = engine().await;
  assert!(engine.site_progress().await.unwrap().is_empty());
}

#[tokio::test]
async fn zero_worker_site_reports_zeroed_metrics() {
  let (store, engine) = engine().await;
  seed_site(&store).await;

  let rows = engine.site_progress().await.unwrap();
  assert_eq!(rows.len(), 1);
  let row = &rows[0];
  assert_eq!(row.workers, 0);
  assert_eq!(row.workers_ok, 0);
  assert_eq!(row.coverage_pct, 0.0);
  assert_eq!(row.missing_total, 0);
  assert_eq!(semaphore(row), Semaphore::Critical);
}

#[tokio::test]
async fn partial_coverage_is_critical() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;
  // Worker 1 has two required types, worker 2 has one: 3 of 14 slots.
  seed_worker(&store, site_id, "1-9", "Pérez", &[
    "REGISTRO_EPP",
    "ENTREGA_RIOHS",
  ])
  .await;
  seed_worker(&store, site_id, "2-7", "Soto", &["REGISTRO_EPP"]).await;

  let rows = engine.site_progress().await.unwrap();
  let row = &rows[0];
  assert_eq!(row.workers, 2);
  assert_eq!(row.workers_ok, 0);
  assert_eq!(row.missing_total, 2 * 7 - 3);
  assert_eq!(row.coverage_pct, 21.4);
  assert_eq!(semaphore(row), Semaphore::Critical);
}

#[tokio::test]
async fn full_coverage_is_ok() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;
  seed_worker(&store, site_id, "1-9", "Pérez", REQUIRED_WORKER_DOCS).await;
  seed_worker(&store, site_id, "2-7", "Soto", REQUIRED_WORKER_DOCS).await;

  let rows = engine.site_progress().await.unwrap();
  let row = &rows[0];
  assert_eq!(row.workers, 2);
  assert_eq!(row.workers_ok, 2);
  assert_eq!(row.missing_total, 0);
  assert_eq!(row.coverage_pct, 100.0);
  assert_eq!(semaphore(row), Semaphore::Ok);
}

#[tokio::test]
async fn mid_coverage_is_pending() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;
  // 10 of 14 slots: 71.4% — above the critical threshold, not complete.
  seed_worker(&store, site_id, "1-9", "Pérez", REQUIRED_WORKER_DOCS).await;
  seed_worker(&store, site_id, "2-7", "Soto", &[
    "REGISTRO_EPP",
    "ENTREGA_RIOHS",
    "IRL",
  ])
  .await;

  let rows = engine.site_progress().await.unwrap();
  let row = &rows[0];
  assert_eq!(row.workers_ok, 1);
  assert_eq!(row.coverage_pct, 71.4);
  assert_eq!(row.missing_total, 4);
  assert_eq!(semaphore(row), Semaphore::Pending);
}

#[tokio::test]
async fn duplicate_uploads_count_once() {
  let (store, engine) = engine().await;
  let site_id = seed_site(&store).await;
  seed_worker(&store, site_id, "1-9", "Pérez", &[
    "REGISTRO_EPP",
    "REGISTRO_EPP",
    "REGISTRO_EPP",
  ])
  .await;

  let rows = engine.site_progress().await.unwrap();
  assert_eq!(rows[0].missing_total, 7 - 1);
}

// ─── Semaphore edge cases ────────────────────────────────────────────────────

#[test]
fn zero_workers_beats_vacuous_full_coverage() {
  let r = row(0, 100.0, 0);
  assert_eq!(semaphore(&r), Semaphore::Critical);
}

#[test]
fn coverage_thresholds() {
  assert_eq!(semaphore(&row(2, 69.9, 5)), Semaphore::Critical);
  assert_eq!(semaphore(&row(2, 70.0, 5)), Semaphore::Pending);
  assert_eq!(semaphore(&row(2, 100.0, 0)), Semaphore::Ok);
}
