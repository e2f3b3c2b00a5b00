//! [`ArchiveBuilder`] — site and monthly ZIP exports.

use std::{
  collections::HashSet,
  fs,
  io::{Cursor, Seek, Write},
  path::Path,
  sync::Arc,
};

use chrono::Utc;
use tracing::debug;
use zip::{CompressionMethod, write::FileOptions, write::ZipWriter};

use faena_compliance::ComplianceEngine;
use faena_core::{
  history::{
    ExportRecord, MonthlyExportRecord, NewExportRecord,
    NewMonthlyExportRecord,
  },
  integrity::{sanitize_segment, sha256_hex},
  layout::{StorageLayout, timestamp_token},
  store::{SiteHeader, SiteStore},
};

use crate::{Error, Result, manifest};

/// Which categories a site archive includes, and optional per-category
/// allow-lists of document types (`None` = include every type).
#[derive(Debug, Clone)]
pub struct SiteArchiveOptions {
  pub include_contract:       bool,
  pub include_annexes:        bool,
  pub include_site_company:   bool,
  pub include_global_company: bool,
  pub include_workers:        bool,
  pub global_company_types:   Option<HashSet<String>>,
  pub site_company_types:     Option<HashSet<String>>,
  pub worker_types:           Option<HashSet<String>>,
}

impl Default for SiteArchiveOptions {
  fn default() -> Self {
    Self {
      include_contract:       true,
      include_annexes:        true,
      include_site_company:   true,
      include_global_company: true,
      include_workers:        true,
      global_company_types:   None,
      site_company_types:     None,
      worker_types:           None,
    }
  }
}

fn passes(filter: &Option<HashSet<String>>, doc_type: &str) -> bool {
  filter.as_ref().is_none_or(|set| set.contains(doc_type))
}

/// Read a recorded file, or skip it: uploaded binaries may be pruned
/// independently of their records, and a stale record must never abort an
/// archive build.
fn read_if_exists(path: &str) -> Option<Vec<u8>> {
  match fs::read(path) {
    Ok(bytes) => Some(bytes),
    Err(e) => {
      debug!(path, error = %e, "recorded file missing on storage, skipping");
      None
    }
  }
}

/// Base name of a recorded path for use as an archive entry name; path
/// components (including any `..`) never reach the archive.
fn entry_file_name(path: &str, fallback: &str) -> String {
  Path::new(path)
    .file_name()
    .and_then(|n| n.to_str())
    .filter(|s| !s.is_empty() && *s != "." && *s != "..")
    .unwrap_or(fallback)
    .to_string()
}

/// Builds export archives over a [`SiteStore`].
///
/// Cloning is cheap — the store handle is reference-counted.
#[derive(Clone)]
pub struct ArchiveBuilder<S> {
  store:  Arc<S>,
  engine: ComplianceEngine<S>,
  layout: StorageLayout,
}

impl<S: SiteStore> ArchiveBuilder<S> {
  pub fn new(store: Arc<S>, layout: StorageLayout) -> Self {
    let engine = ComplianceEngine::new(store.clone());
    Self { store, engine, layout }
  }

  // ── Site archives ─────────────────────────────────────────────────────────

  /// Build the export archive for one site. Returns the ZIP bytes and the
  /// site's display name (used by callers to name the download and the
  /// persisted file).
  pub async fn build_site_archive(
    &self,
    site_id: i64,
    opts: &SiteArchiveOptions,
  ) -> Result<(Vec<u8>, String)> {
    let header = self
      .store
      .site_header(site_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SiteNotFound(site_id))?;

    let mut buffer = Vec::new();
    {
      let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
      self.append_site_tree(&mut zip, "", &header, opts).await?;
      zip.finish()?;
    }

    let name = header.site.name.clone();
    Ok((buffer, name))
  }

  /// Build one archive covering every site whose start date falls in the
  /// given month. Global company documents are written exactly once at the
  /// archive root when `include_global_company` is set, never per site.
  /// Returns the ZIP bytes and the `YYYY-MM` key.
  pub async fn build_monthly_archive(
    &self,
    year: i32,
    month: u32,
    include_global_company: bool,
  ) -> Result<(Vec<u8>, String)> {
    let ym = format!("{year:04}-{month:02}");
    let sites = self
      .store
      .sites_started_in(&ym)
      .await
      .map_err(Error::store)?;
    if sites.is_empty() {
      return Err(Error::EmptyMonth(ym));
    }

    let options = zip_options();
    let mut buffer = Vec::new();
    {
      let mut zip = ZipWriter::new(Cursor::new(&mut buffer));

      zip.start_file(format!("{ym}/00_Index_Mes.txt"), options)?;
      zip.write_all(manifest::month_index(&ym, &sites).as_bytes())?;

      if include_global_company {
        let docs =
          self.store.company_documents().await.map_err(Error::store)?;
        for doc in docs {
          let Some(bytes) = read_if_exists(&doc.file_path) else {
            continue;
          };
          let file_name = entry_file_name(&doc.file_path, &doc.file_name);
          let doc_type = sanitize_segment(&doc.doc_type);
          zip.start_file(
            format!("{ym}/00_Documentos_Empresa_Global/{doc_type}/{file_name}"),
            options,
          )?;
          zip.write_all(&bytes)?;
        }
      }

      // Per-site subtrees reuse the standard layout; global company docs
      // are already at the root, so they are excluded here.
      let subtree_opts = SiteArchiveOptions {
        include_global_company: false,
        ..SiteArchiveOptions::default()
      };
      for overview in &sites {
        let Some(header) = self
          .store
          .site_header(overview.site.id)
          .await
          .map_err(Error::store)?
        else {
          continue;
        };
        let prefix = format!(
          "{ym}/FAENA_{}_{}/",
          header.site.id,
          sanitize_segment(&header.site.name)
        );
        self
          .append_site_tree(&mut zip, &prefix, &header, &subtree_opts)
          .await?;
      }

      zip.finish()?;
    }

    Ok((buffer, ym))
  }

  /// Write one site's manifest and document tree under `prefix`.
  async fn append_site_tree<W: Write + Seek>(
    &self,
    zip: &mut ZipWriter<W>,
    prefix: &str,
    header: &SiteHeader,
    opts: &SiteArchiveOptions,
  ) -> Result<()> {
    let site_id = header.site.id;
    let options = zip_options();

    // The pending manifest is always included as a guide.
    let worker_pending =
      self.engine.missing_worker_documents(site_id).await?;
    let company_missing =
      self.engine.missing_company_documents(site_id).await?;
    zip.start_file(format!("{prefix}99_Index_Pendientes.txt"), options)?;
    zip.write_all(
      manifest::pending_index(header, &worker_pending, &company_missing)
        .as_bytes(),
    )?;

    if opts.include_contract {
      if let Some(path) = header.contract_path.as_deref() {
        if let Some(bytes) = read_if_exists(path) {
          let file_name = entry_file_name(path, "contrato");
          zip
            .start_file(format!("{prefix}00_Contrato_Faena/{file_name}"), options)?;
          zip.write_all(&bytes)?;
        }
      }
    }

    if opts.include_annexes {
      let annexes =
        self.store.annexes(site_id).await.map_err(Error::store)?;
      for annex in annexes {
        let Some(bytes) = read_if_exists(&annex.file_path) else {
          continue;
        };
        let file_name = entry_file_name(&annex.file_path, &annex.name);
        zip
          .start_file(format!("{prefix}01_Anexos_Faena/{file_name}"), options)?;
        zip.write_all(&bytes)?;
      }
    }

    if opts.include_global_company {
      let docs =
        self.store.company_documents().await.map_err(Error::store)?;
      for doc in docs {
        if !passes(&opts.global_company_types, &doc.doc_type) {
          continue;
        }
        let Some(bytes) = read_if_exists(&doc.file_path) else {
          continue;
        };
        let file_name = entry_file_name(&doc.file_path, &doc.file_name);
        let doc_type = sanitize_segment(&doc.doc_type);
        zip.start_file(
          format!("{prefix}02_Documentos_Empresa/{doc_type}/{file_name}"),
          options,
        )?;
        zip.write_all(&bytes)?;
      }
    }

    if opts.include_site_company {
      let docs = self
        .store
        .site_company_documents(site_id)
        .await
        .map_err(Error::store)?;
      for doc in docs {
        if !passes(&opts.site_company_types, &doc.doc_type) {
          continue;
        }
        let Some(bytes) = read_if_exists(&doc.file_path) else {
          continue;
        };
        let file_name = entry_file_name(&doc.file_path, &doc.file_name);
        let doc_type = sanitize_segment(&doc.doc_type);
        zip.start_file(
          format!("{prefix}02_Documentos_Empresa_Faena/{doc_type}/{file_name}"),
          options,
        )?;
        zip.write_all(&bytes)?;
      }
    }

    if opts.include_workers {
      let workers = self
        .store
        .assigned_workers(site_id)
        .await
        .map_err(Error::store)?;
      for worker in workers {
        let folder = worker.folder();
        let docs = self
          .store
          .worker_documents(worker.id)
          .await
          .map_err(Error::store)?;
        for doc in docs {
          if !passes(&opts.worker_types, &doc.doc_type) {
            continue;
          }
          let Some(bytes) = read_if_exists(&doc.file_path) else {
            continue;
          };
          let file_name = entry_file_name(&doc.file_path, &doc.file_name);
          let doc_type = sanitize_segment(&doc.doc_type);
          zip.start_file(
            format!("{prefix}03_Trabajadores/{folder}/{doc_type}/{file_name}"),
            options,
          )?;
          zip.write_all(&bytes)?;
        }
      }
    }

    Ok(())
  }

  // ── Persisting ────────────────────────────────────────────────────────────

  /// Write built site-archive bytes under the upload root and append the
  /// history row. Separate from building so builds stay side-effect free.
  pub async fn persist_export(
    &self,
    site_id: i64,
    bytes: &[u8],
    display_name: &str,
  ) -> Result<ExportRecord> {
    let file_name = format!(
      "faena_{site_id}_{}_{}.zip",
      sanitize_segment(display_name),
      timestamp_token(Utc::now()),
    );
    let dir = self.layout.site_exports_dir(site_id);
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;

    self
      .store
      .record_export(NewExportRecord {
        site_id,
        file_path: path.to_string_lossy().into_owned(),
        sha256: sha256_hex(bytes),
        size_bytes: bytes.len() as i64,
      })
      .await
      .map_err(Error::store)
  }

  /// The monthly analogue of [`Self::persist_export`].
  pub async fn persist_monthly_export(
    &self,
    year_month: &str,
    bytes: &[u8],
  ) -> Result<MonthlyExportRecord> {
    let file_name =
      format!("mes_{year_month}_{}.zip", timestamp_token(Utc::now()));
    let dir = self.layout.monthly_exports_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;

    self
      .store
      .record_monthly_export(NewMonthlyExportRecord {
        year_month: year_month.to_owned(),
        file_path:  path.to_string_lossy().into_owned(),
        sha256:     Some(sha256_hex(bytes)),
        size_bytes: Some(bytes.len() as i64),
      })
      .await
      .map_err(Error::store)
  }
}

fn zip_options() -> FileOptions {
  // Default timestamps are the fixed DOS epoch, keeping repeated builds of
  // identical inputs byte-stable.
  FileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .unix_permissions(0o644)
}
