//! Archive-builder tests against an in-memory store and a temp upload tree.

use std::{collections::HashSet, fs, io::Read, path::Path, sync::Arc};

use chrono::NaiveDate;
use faena_core::{
  document::{NewCompanyDocument, NewSiteCompanyDocument, NewWorkerDocument},
  layout::StorageLayout,
  integrity::sha256_hex,
  site::{NewAnnex, NewContract, NewSite, SiteStatus},
  store::SiteStore,
  worker::{AssignmentStatus, NewAssignment, NewWorker},
};
use faena_store_sqlite::SqliteStore;
use tempfile::TempDir;

use crate::{ArchiveBuilder, Error, SiteArchiveOptions};

struct Fixture {
  _dir:    TempDir,
  store:   Arc<SqliteStore>,
  builder: ArchiveBuilder<SqliteStore>,
  layout:  StorageLayout,
}

async fn fixture() -> Fixture {
  let dir = TempDir::new().unwrap();
  let layout = StorageLayout::new(dir.path());
  layout.ensure_dirs().unwrap();
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let builder = ArchiveBuilder::new(store.clone(), layout.clone());
  Fixture { _dir: dir, store, builder, layout }
}

fn date(s: &str) -> NaiveDate {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Write a fake uploaded binary and return its recorded path.
fn upload(layout: &StorageLayout, name: &str, contents: &[u8]) -> String {
  layout
    .save_upload(&["docs"], name, contents)
    .unwrap()
    .to_string_lossy()
    .into_owned()
}

async fn seed_site(fx: &Fixture, name: &str, start: &str) -> i64 {
  let client = fx.store.add_client("Minera Andes").await.unwrap();
  fx.store
    .add_site(NewSite {
      client_id:   client.id,
      contract_id: None,
      name:        name.into(),
      location:    "Antofagasta".into(),
      start_date:  date(start),
      end_date:    None,
      status:      SiteStatus::Active,
    })
    .await
    .unwrap()
    .id
}

async fn seed_worker_with_doc(
  fx: &Fixture,
  site_id: i64,
  natural_id: &str,
  family: &str,
  given: &str,
  doc_type: &str,
  file: &str,
) -> i64 {
  let worker = fx
    .store
    .add_worker(NewWorker {
      natural_id:         natural_id.into(),
      given_names:        given.into(),
      family_names:       family.into(),
      job_title:          String::new(),
      cost_center:        None,
      email:              None,
      hired_at:           None,
      medical_exam_until: None,
    })
    .await
    .unwrap();
  fx.store
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
  let path = upload(&fx.layout, file, b"doc-bytes");
  fx.store
    .add_worker_document(NewWorkerDocument {
      worker_id: worker.id,
      doc_type:  doc_type.into(),
      file_name: file.into(),
      file_path: path.clone(),
      sha256:    sha256_hex(b"doc-bytes"),
    })
    .await
    .unwrap();
  worker.id
}

fn entry_names(bytes: &[u8]) -> HashSet<String> {
  let mut archive =
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
  (0..archive.len())
    .map(|i| archive.by_index(i).unwrap().name().to_string())
    .collect()
}

fn read_entry(bytes: &[u8], name: &str) -> String {
  let mut archive =
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
  let mut entry = archive.by_name(name).unwrap();
  let mut out = String::new();
  entry.read_to_string(&mut out).unwrap();
  out
}

// ─── Site archives ───────────────────────────────────────────────────────────

#[tokio::test]
async fn site_archive_has_deterministic_layout() {
  let fx = fixture().await;
  let client = fx.store.add_client("Cliente B").await.unwrap();
  let contract_path = upload(&fx.layout, "contrato.pdf", b"contrato");
  let contract = fx
    .store
    .add_contract(NewContract {
      client_id:  client.id,
      name:       "Contrato Marco".into(),
      start_date: None,
      end_date:   None,
      file_path:  Some(contract_path),
      sha256:     Some(sha256_hex(b"contrato")),
    })
    .await
    .unwrap();
  let site = fx
    .store
    .add_site(NewSite {
      client_id:   client.id,
      contract_id: Some(contract.id),
      name:        "Planta Norte".into(),
      location:    "Antofagasta".into(),
      start_date:  date("2025-03-01"),
      end_date:    None,
      status:      SiteStatus::Active,
    })
    .await
    .unwrap();

  let annex_path = upload(&fx.layout, "plano.pdf", b"plano");
  fx.store
    .add_annex(NewAnnex {
      site_id:   site.id,
      name:      "plano.pdf".into(),
      file_path: annex_path,
      sha256:    sha256_hex(b"plano"),
    })
    .await
    .unwrap();

  let global_path = upload(&fx.layout, "laboral.pdf", b"laboral");
  fx.store
    .add_company_document(NewCompanyDocument {
      doc_type:  "CERTIFICADO_CUMPLIMIENTO_LABORAL".into(),
      file_name: "laboral.pdf".into(),
      file_path: global_path,
      sha256:    sha256_hex(b"laboral"),
    })
    .await
    .unwrap();

  let site_doc_path = upload(&fx.layout, "accidentes.pdf", b"accidentes");
  fx.store
    .add_site_company_document(NewSiteCompanyDocument {
      site_id:   site.id,
      doc_type:  "CERTIFICADO_ACCIDENTABILIDAD".into(),
      file_name: "accidentes.pdf".into(),
      file_path: site_doc_path,
      sha256:    sha256_hex(b"accidentes"),
    })
    .await
    .unwrap();

  seed_worker_with_doc(
    &fx,
    site.id,
    "1-9",
    "Soto",
    "Ana",
    "REGISTRO_EPP",
    "epp.pdf",
  )
  .await;

  let (bytes, name) = fx
    .builder
    .build_site_archive(site.id, &SiteArchiveOptions::default())
    .await
    .unwrap();
  assert_eq!(name, "Planta Norte");

  let names = entry_names(&bytes);
  assert!(names.contains("99_Index_Pendientes.txt"));
  assert!(names.contains("00_Contrato_Faena/contrato.pdf"));
  assert!(names.contains("01_Anexos_Faena/plano.pdf"));
  assert!(names.contains(
    "02_Documentos_Empresa/certificado_cumplimiento_laboral/laboral.pdf"
  ));
  assert!(names.contains(
    "02_Documentos_Empresa_Faena/certificado_accidentabilidad/accidentes.pdf"
  ));
  assert!(
    names.contains("03_Trabajadores/soto_ana_1_9/registro_epp/epp.pdf")
  );
}

#[tokio::test]
async fn manifest_reports_header_and_pending() {
  let fx = fixture().await;
  let site_id = seed_site(&fx, "Planta Norte", "2025-03-01").await;
  seed_worker_with_doc(
    &fx,
    site_id,
    "1-9",
    "Soto",
    "Ana",
    "REGISTRO_EPP",
    "epp.pdf",
  )
  .await;

  let (bytes, _) = fx
    .builder
    .build_site_archive(site_id, &SiteArchiveOptions::default())
    .await
    .unwrap();
  let manifest = read_entry(&bytes, "99_Index_Pendientes.txt");

  assert!(manifest.contains("MANDANTE: Minera Andes"));
  assert!(manifest.contains("FAENA: Planta Norte"));
  assert!(manifest.contains("ESTADO: ACTIVE"));
  assert!(manifest.contains("INICIO: 2025-03-01 | TERMINO: -"));
  assert!(manifest.contains("UBICACION: Antofagasta"));
  assert!(manifest.contains("CONTRATO_FAENA: (sin contrato cargado)"));
  assert!(manifest.contains(
    "* Soto Ana (1-9): faltan ENTREGA_RIOHS, IRL, CONTRATO_TRABAJO, \
     ANEXO_CONTRATO, LIQUIDACIONES, FINIQUITO"
  ));
  assert!(manifest.contains("PENDIENTES DOCUMENTOS EMPRESA (POR FAENA):"));
  assert!(manifest.contains(
    "* faltan: CERTIFICADO_CUMPLIMIENTO_LABORAL, \
     CERTIFICADO_ACCIDENTABILIDAD"
  ));
}

#[tokio::test]
async fn manifest_written_even_when_everything_is_empty() {
  let fx = fixture().await;
  let site_id = seed_site(&fx, "Planta Norte", "2025-03-01").await;

  let (bytes, _) = fx
    .builder
    .build_site_archive(site_id, &SiteArchiveOptions::default())
    .await
    .unwrap();
  let manifest = read_entry(&bytes, "99_Index_Pendientes.txt");
  assert!(manifest.contains("- (sin trabajadores asignados)"));

  assert_eq!(entry_names(&bytes).len(), 1);
}

#[tokio::test]
async fn unknown_site_fails_with_not_found() {
  let fx = fixture().await;
  let err = fx
    .builder
    .build_site_archive(404, &SiteArchiveOptions::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SiteNotFound(404)));
}

#[tokio::test]
async fn identical_inputs_build_identical_bytes() {
  let fx = fixture().await;
  let site_id = seed_site(&fx, "Planta Norte", "2025-03-01").await;
  seed_worker_with_doc(
    &fx,
    site_id,
    "1-9",
    "Soto",
    "Ana",
    "REGISTRO_EPP",
    "epp.pdf",
  )
  .await;

  let opts = SiteArchiveOptions::default();
  let (first, _) =
    fx.builder.build_site_archive(site_id, &opts).await.unwrap();
  let (second, _) =
    fx.builder.build_site_archive(site_id, &opts).await.unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn stale_file_records_are_skipped_silently() {
  let fx = fixture().await;
  let site_id = seed_site(&fx, "Planta Norte", "2025-03-01").await;
  let worker_id = seed_worker_with_doc(
    &fx,
    site_id,
    "1-9",
    "Soto",
    "Ana",
    "REGISTRO_EPP",
    "epp.pdf",
  )
  .await;
  fx.store
    .add_worker_document(NewWorkerDocument {
      worker_id,
      doc_type: "IRL".into(),
      file_name: "irl.pdf".into(),
      file_path: fx
        .layout
        .upload_root()
        .join("docs/pruned.pdf")
        .to_string_lossy()
        .into_owned(),
      sha256: "0".repeat(64),
    })
    .await
    .unwrap();

  let (bytes, _) = fx
    .builder
    .build_site_archive(site_id, &SiteArchiveOptions::default())
    .await
    .unwrap();

  let names = entry_names(&bytes);
  assert!(
    names.contains("03_Trabajadores/soto_ana_1_9/registro_epp/epp.pdf")
  );
  assert!(!names.iter().any(|n| n.contains("irl")));
}

#[tokio::test]
async fn inclusion_flags_and_type_filters_are_honored() {
  let fx = fixture().await;
  let site_id = seed_site(&fx, "Planta Norte", "2025-03-01").await;
  let worker_id = seed_worker_with_doc(
    &fx,
    site_id,
    "1-9",
    "Soto",
    "Ana",
    "REGISTRO_EPP",
    "epp.pdf",
  )
  .await;
  let irl_path = upload(&fx.layout, "irl.pdf", b"irl");
  fx.store
    .add_worker_document(NewWorkerDocument {
      worker_id,
      doc_type: "IRL".into(),
      file_name: "irl.pdf".into(),
      file_path: irl_path,
      sha256: sha256_hex(b"irl"),
    })
    .await
    .unwrap();

  let opts = SiteArchiveOptions {
    include_annexes: false,
    include_site_company: false,
    include_global_company: false,
    worker_types: Some(HashSet::from(["IRL".to_string()])),
    ..SiteArchiveOptions::default()
  };
  let (bytes, _) =
    fx.builder.build_site_archive(site_id, &opts).await.unwrap();

  let names = entry_names(&bytes);
  assert!(names.contains("03_Trabajadores/soto_ana_1_9/irl/irl.pdf"));
  assert!(!names.iter().any(|n| n.contains("registro_epp")));

  let workerless = SiteArchiveOptions {
    include_workers: false,
    ..SiteArchiveOptions::default()
  };
  let (bytes, _) = fx
    .builder
    .build_site_archive(site_id, &workerless)
    .await
    .unwrap();
  assert!(!entry_names(&bytes).iter().any(|n| n.starts_with("03_")));
}

// ─── Monthly archives ────────────────────────────────────────────────────────

#[tokio::test]
async fn monthly_archive_groups_sites_and_writes_global_docs_once() {
  let fx = fixture().await;
  let march_a = seed_site(&fx, "Obra A", "2025-03-05").await;
  let client = fx.store.add_client("Cliente B").await.unwrap();
  let march_b = fx
    .store
    .add_site(NewSite {
      client_id:   client.id,
      contract_id: None,
      name:        "Obra B".into(),
      location:    String::new(),
      start_date:  date("2025-03-20"),
      end_date:    None,
      status:      SiteStatus::Active,
    })
    .await
    .unwrap()
    .id;
  // Outside the month; must not appear.
  fx.store
    .add_site(NewSite {
      client_id:   client.id,
      contract_id: None,
      name:        "Obra Abril".into(),
      location:    String::new(),
      start_date:  date("2025-04-02"),
      end_date:    None,
      status:      SiteStatus::Active,
    })
    .await
    .unwrap();

  let global_path = upload(&fx.layout, "laboral.pdf", b"laboral");
  fx.store
    .add_company_document(NewCompanyDocument {
      doc_type:  "CERTIFICADO_CUMPLIMIENTO_LABORAL".into(),
      file_name: "laboral.pdf".into(),
      file_path: global_path,
      sha256:    sha256_hex(b"laboral"),
    })
    .await
    .unwrap();

  let (bytes, ym) =
    fx.builder.build_monthly_archive(2025, 3, true).await.unwrap();
  assert_eq!(ym, "2025-03");

  let names = entry_names(&bytes);
  assert!(names.contains("2025-03/00_Index_Mes.txt"));
  let global: Vec<_> = names
    .iter()
    .filter(|n| n.contains("00_Documentos_Empresa_Global"))
    .collect();
  assert_eq!(global, [
    "2025-03/00_Documentos_Empresa_Global/certificado_cumplimiento_laboral/laboral.pdf"
  ]);
  assert!(names.contains(&format!(
    "2025-03/FAENA_{march_a}_obra_a/99_Index_Pendientes.txt"
  )));
  assert!(names.contains(&format!(
    "2025-03/FAENA_{march_b}_obra_b/99_Index_Pendientes.txt"
  )));
  assert!(!names.iter().any(|n| n.contains("obra_abril")));

  let index = read_entry(&bytes, "2025-03/00_Index_Mes.txt");
  assert!(index.contains("EXPORT MENSUAL: 2025-03"));
  assert!(index.contains("FAENAS INCLUIDAS: 2"));
  assert!(index.contains("Obra A"));
}

#[tokio::test]
async fn empty_month_is_an_error() {
  let fx = fixture().await;
  seed_site(&fx, "Planta Norte", "2025-03-01").await;

  let err =
    fx.builder.build_monthly_archive(2025, 7, true).await.unwrap_err();
  assert!(matches!(err, Error::EmptyMonth(ym) if ym == "2025-07"));
}

// ─── Persisting ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn persist_export_writes_file_and_history_row() {
  let fx = fixture().await;
  let site_id = seed_site(&fx, "Planta Norte", "2025-03-01").await;

  let (bytes, name) = fx
    .builder
    .build_site_archive(site_id, &SiteArchiveOptions::default())
    .await
    .unwrap();
  let record =
    fx.builder.persist_export(site_id, &bytes, &name).await.unwrap();

  assert_eq!(record.site_id, site_id);
  assert_eq!(record.sha256, sha256_hex(&bytes));
  assert_eq!(record.size_bytes, bytes.len() as i64);
  assert!(Path::new(&record.file_path).exists());
  assert_eq!(fs::read(&record.file_path).unwrap(), bytes);
  assert!(record.file_path.contains("faena_"));
  assert!(record.file_path.contains("planta_norte"));
}

#[tokio::test]
async fn persist_monthly_export_writes_under_mes() {
  let fx = fixture().await;
  seed_site(&fx, "Planta Norte", "2025-03-01").await;

  let (bytes, ym) =
    fx.builder.build_monthly_archive(2025, 3, false).await.unwrap();
  let record =
    fx.builder.persist_monthly_export(&ym, &bytes).await.unwrap();

  assert_eq!(record.year_month, "2025-03");
  assert_eq!(record.sha256.as_deref(), Some(sha256_hex(&bytes).as_str()));
  assert!(record.file_path.contains("exports/mes"));
  assert!(Path::new(&record.file_path).exists());
}
