//! `faena` binary — the command-line collaborator for the compliance core.
//!
//! Reads `faena.toml` (or the path given with `--config`), opens the
//! SQLite store under the configured data directory, and exposes the core
//! operations as subcommands. No business rules live here: records go in
//! validated, archives and snapshots come out as bytes on disk.
//!
//! Every mutating subcommand ends with an automatic database snapshot
//! unless `auto_backup` is disabled in config.

use std::{
  collections::HashSet,
  fs,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use faena_backup::BackupManager;
use faena_compliance::{ComplianceEngine, semaphore};
use faena_core::{
  document::{NewCompanyDocument, NewSiteCompanyDocument, NewWorkerDocument},
  integrity::{sanitize_segment, sha256_hex},
  layout::StorageLayout,
  site::{NewAnnex, NewContract, NewSite, SiteStatus},
  store::SiteStore,
  worker::{AssignmentStatus, NewAssignment, NewWorker},
};
use faena_export::{ArchiveBuilder, SiteArchiveOptions};
use faena_store_sqlite::SqliteStore;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AppConfig {
  /// Directory holding the database and the upload tree.
  #[serde(default = "default_data_dir")]
  data_dir:          PathBuf,
  /// Snapshot the database automatically after every mutating command.
  #[serde(default = "default_auto_backup")]
  auto_backup:       bool,
  /// How many auto-backup records retention keeps.
  #[serde(default = "default_keep_auto_backups")]
  keep_auto_backups: usize,
}

fn default_data_dir() -> PathBuf { PathBuf::from("./data") }
fn default_auto_backup() -> bool { true }
fn default_keep_auto_backups() -> usize {
  faena_backup::DEFAULT_KEEP_LAST
}

// ─── CLI surface ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Site document compliance tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "faena.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the data directory and an empty database.
  Init,

  /// Register a client.
  AddClient { name: String },

  /// Register a site contract for a client, optionally attaching a file.
  AddContract {
    #[arg(long)]
    client_id:  i64,
    #[arg(long)]
    name:       String,
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    end_date:   Option<NaiveDate>,
    #[arg(long)]
    file:       Option<PathBuf>,
  },

  /// Register a site.
  AddSite {
    #[arg(long)]
    client_id:   i64,
    #[arg(long)]
    contract_id: Option<i64>,
    #[arg(long)]
    name:        String,
    #[arg(long, default_value = "")]
    location:    String,
    #[arg(long)]
    start_date:  NaiveDate,
    #[arg(long)]
    end_date:    Option<NaiveDate>,
    /// Mark the site FINISHED (requires --end-date).
    #[arg(long)]
    finished:    bool,
  },

  /// Register a worker.
  AddWorker {
    #[arg(long)]
    natural_id: String,
    #[arg(long)]
    given:      String,
    #[arg(long)]
    family:     String,
    #[arg(long, default_value = "")]
    job_title:  String,
    #[arg(long)]
    email:      Option<String>,
  },

  /// Assign a worker (by national id) to a site.
  Assign {
    #[arg(long)]
    site_id:    i64,
    #[arg(long)]
    worker:     String,
    #[arg(long)]
    entry_date: NaiveDate,
    #[arg(long, default_value = "")]
    job_title:  String,
  },

  /// Upload a document for a worker (by national id).
  UploadWorkerDoc {
    #[arg(long)]
    worker:   String,
    #[arg(long)]
    doc_type: String,
    file:     PathBuf,
  },

  /// Upload a global company document.
  UploadCompanyDoc {
    #[arg(long)]
    doc_type: String,
    file:     PathBuf,
  },

  /// Upload a company document scoped to one site.
  UploadSiteCompanyDoc {
    #[arg(long)]
    site_id:  i64,
    #[arg(long)]
    doc_type: String,
    file:     PathBuf,
  },

  /// Attach an annex file to a site.
  UploadAnnex {
    #[arg(long)]
    site_id: i64,
    file:    PathBuf,
  },

  /// Per-site coverage table with semaphore status.
  Progress {
    /// Emit the rows as JSON instead of a table.
    #[arg(long)]
    json: bool,
  },

  /// Missing mandatory documents for one site.
  Missing {
    site_id: i64,
    #[arg(long)]
    json:    bool,
  },

  /// Build (and optionally persist) the export archive for one site.
  ExportSite {
    site_id: i64,
    /// Output path; defaults to ./faena_<id>_<name>.zip.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    skip_contract: bool,
    #[arg(long)]
    skip_annexes: bool,
    #[arg(long)]
    skip_site_company: bool,
    #[arg(long)]
    skip_global_company: bool,
    #[arg(long)]
    skip_workers: bool,
    /// Only include these worker document types.
    #[arg(long, value_delimiter = ',')]
    worker_types: Vec<String>,
    /// Only include these per-site company document types.
    #[arg(long, value_delimiter = ',')]
    site_company_types: Vec<String>,
    /// Only include these global company document types.
    #[arg(long, value_delimiter = ',')]
    global_company_types: Vec<String>,
    /// Also write the archive under the upload root and record it.
    #[arg(long)]
    persist: bool,
  },

  /// Build (and optionally persist) the archive for one calendar month.
  ExportMonth {
    year:  i32,
    month: u32,
    /// Output path; defaults to ./mes_<YYYY-MM>.zip.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Leave global company documents out of the archive root.
    #[arg(long)]
    skip_global_company: bool,
    #[arg(long)]
    persist: bool,
  },

  /// Write a full backup (database + uploads) to a file.
  Backup { out: PathBuf },

  /// Restore database and uploads from a backup archive.
  Restore { input: PathBuf },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("FAENA"))
    .build()
    .context("failed to read config file")?;
  let cfg: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")?;

  let layout = StorageLayout::new(&cfg.data_dir);
  layout.ensure_dirs().context("failed to create data directories")?;

  // Restore replaces the store's on-disk state wholesale, so it runs
  // before any store handle is opened.
  if let Command::Restore { input } = &cli.command {
    let bytes = fs::read(input)
      .with_context(|| format!("failed to read {}", input.display()))?;
    let outcome = faena_backup::restore(&layout, &bytes).await?;
    println!(
      "restore complete (uploads replaced: {})",
      outcome.uploads_replaced
    );
    return Ok(());
  }

  let store = Arc::new(
    SqliteStore::open(layout.db_path())
      .await
      .context("failed to open store")?,
  );
  let engine = ComplianceEngine::new(store.clone());
  let builder = ArchiveBuilder::new(store.clone(), layout.clone());
  let backups = BackupManager::new((*store).clone(), layout.clone())
    .with_retention(cfg.keep_auto_backups);

  match cli.command {
    Command::Init => {
      println!("initialised data directory at {}", cfg.data_dir.display());
    }

    Command::AddClient { name } => {
      let client = store.add_client(&name).await?;
      println!("client {} created: {}", client.id, client.name);
      auto_snapshot(&backups, cfg.auto_backup, "add_client").await;
    }

    Command::AddContract { client_id, name, start_date, end_date, file } => {
      let (file_path, sha256) = match file {
        Some(path) => {
          let (stored, digest) =
            store_upload(&layout, &["contratos"], &path)?;
          (Some(stored), Some(digest))
        }
        None => (None, None),
      };
      let contract = store
        .add_contract(NewContract {
          client_id,
          name,
          start_date,
          end_date,
          file_path,
          sha256,
        })
        .await?;
      println!("contract {} created: {}", contract.id, contract.name);
      auto_snapshot(&backups, cfg.auto_backup, "add_contract").await;
    }

    Command::AddSite {
      client_id,
      contract_id,
      name,
      location,
      start_date,
      end_date,
      finished,
    } => {
      let status =
        if finished { SiteStatus::Finished } else { SiteStatus::Active };
      let site = store
        .add_site(NewSite {
          client_id,
          contract_id,
          name,
          location,
          start_date,
          end_date,
          status,
        })
        .await?;
      println!("site {} created: {}", site.id, site.name);
      auto_snapshot(&backups, cfg.auto_backup, "add_site").await;
    }

    Command::AddWorker { natural_id, given, family, job_title, email } => {
      let worker = store
        .add_worker(NewWorker {
          natural_id,
          given_names: given,
          family_names: family,
          job_title,
          cost_center: None,
          email,
          hired_at: None,
          medical_exam_until: None,
        })
        .await?;
      println!("worker {} created: {}", worker.id, worker.label());
      auto_snapshot(&backups, cfg.auto_backup, "add_worker").await;
    }

    Command::Assign { site_id, worker, entry_date, job_title } => {
      let worker = find_worker(&store, &worker).await?;
      let assignment = store
        .assign_worker(NewAssignment {
          site_id,
          worker_id: worker.id,
          site_job_title: job_title,
          entry_date,
          exit_date: None,
          status: AssignmentStatus::Active,
        })
        .await?;
      println!(
        "assigned {} to site {}",
        worker.label(),
        assignment.site_id
      );
      auto_snapshot(&backups, cfg.auto_backup, "assign").await;
    }

    Command::UploadWorkerDoc { worker, doc_type, file } => {
      let worker = find_worker(&store, &worker).await?;
      let folder = worker.folder();
      let (stored, digest) = store_upload(
        &layout,
        &["trabajadores", &folder, &sanitize_segment(&doc_type)],
        &file,
      )?;
      let doc = store
        .add_worker_document(NewWorkerDocument {
          worker_id: worker.id,
          doc_type,
          file_name: file_name_of(&file),
          file_path: stored,
          sha256: digest,
        })
        .await?;
      println!("document {} stored at {}", doc.id, doc.file_path);
      auto_snapshot(&backups, cfg.auto_backup, "upload_worker_doc").await;
    }

    Command::UploadCompanyDoc { doc_type, file } => {
      let (stored, digest) = store_upload(
        &layout,
        &["empresa", &sanitize_segment(&doc_type)],
        &file,
      )?;
      let doc = store
        .add_company_document(NewCompanyDocument {
          doc_type,
          file_name: file_name_of(&file),
          file_path: stored,
          sha256: digest,
        })
        .await?;
      println!("company document {} stored at {}", doc.id, doc.file_path);
      auto_snapshot(&backups, cfg.auto_backup, "upload_company_doc").await;
    }

    Command::UploadSiteCompanyDoc { site_id, doc_type, file } => {
      let site_dir = format!("faena_{site_id}");
      let (stored, digest) = store_upload(
        &layout,
        &[&site_dir, "empresa", &sanitize_segment(&doc_type)],
        &file,
      )?;
      let doc = store
        .add_site_company_document(NewSiteCompanyDocument {
          site_id,
          doc_type,
          file_name: file_name_of(&file),
          file_path: stored,
          sha256: digest,
        })
        .await?;
      println!(
        "site company document {} stored at {}",
        doc.id, doc.file_path
      );
      auto_snapshot(&backups, cfg.auto_backup, "upload_site_company_doc")
        .await;
    }

    Command::UploadAnnex { site_id, file } => {
      let site_dir = format!("faena_{site_id}");
      let (stored, digest) =
        store_upload(&layout, &[&site_dir, "anexos"], &file)?;
      let annex = store
        .add_annex(NewAnnex {
          site_id,
          name: file_name_of(&file),
          file_path: stored,
          sha256: digest,
        })
        .await?;
      println!("annex {} stored at {}", annex.id, annex.file_path);
      auto_snapshot(&backups, cfg.auto_backup, "upload_annex").await;
    }

    Command::Progress { json } => {
      let rows = engine.site_progress().await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
      }
      if rows.is_empty() {
        println!("no sites registered");
      }
      for row in &rows {
        println!(
          "[{}] site {} {} ({}) workers={} ok={} coverage={:.1}% \
           missing={}",
          semaphore(row),
          row.site_id,
          row.name,
          row.client,
          row.workers,
          row.workers_ok,
          row.coverage_pct,
          row.missing_total,
        );
      }
    }

    Command::Missing { site_id, json } => {
      let pending = engine.missing_worker_documents(site_id).await?;
      let company = engine.missing_company_documents(site_id).await?;
      if json {
        println!(
          "{}",
          serde_json::to_string_pretty(&serde_json::json!({
            "workers": pending,
            "company": company,
          }))?
        );
        return Ok(());
      }
      println!("workers:");
      if pending.is_empty() {
        println!("  (no workers assigned)");
      }
      for entry in &pending {
        if entry.missing.is_empty() {
          println!("  {}: OK", entry.label);
        } else {
          println!("  {}: missing {}", entry.label, entry.missing.join(", "));
        }
      }
      println!("site company documents:");
      if company.is_empty() {
        println!("  OK");
      } else {
        println!("  missing {}", company.join(", "));
      }
    }

    Command::ExportSite {
      site_id,
      out,
      skip_contract,
      skip_annexes,
      skip_site_company,
      skip_global_company,
      skip_workers,
      worker_types,
      site_company_types,
      global_company_types,
      persist,
    } => {
      let opts = SiteArchiveOptions {
        include_contract:       !skip_contract,
        include_annexes:        !skip_annexes,
        include_site_company:   !skip_site_company,
        include_global_company: !skip_global_company,
        include_workers:        !skip_workers,
        worker_types:           type_filter(worker_types),
        site_company_types:     type_filter(site_company_types),
        global_company_types:   type_filter(global_company_types),
      };
      let (bytes, name) = builder.build_site_archive(site_id, &opts).await?;
      let out = out.unwrap_or_else(|| {
        PathBuf::from(format!(
          "faena_{site_id}_{}.zip",
          sanitize_segment(&name)
        ))
      });
      fs::write(&out, &bytes)
        .with_context(|| format!("failed to write {}", out.display()))?;
      println!("wrote {} ({} bytes)", out.display(), bytes.len());
      if persist {
        let record = builder.persist_export(site_id, &bytes, &name).await?;
        println!("recorded export {} at {}", record.id, record.file_path);
      }
    }

    Command::ExportMonth { year, month, out, skip_global_company, persist } => {
      let (bytes, ym) = builder
        .build_monthly_archive(year, month, !skip_global_company)
        .await?;
      let out =
        out.unwrap_or_else(|| PathBuf::from(format!("mes_{ym}.zip")));
      fs::write(&out, &bytes)
        .with_context(|| format!("failed to write {}", out.display()))?;
      println!("wrote {} ({} bytes)", out.display(), bytes.len());
      if persist {
        let record = builder.persist_monthly_export(&ym, &bytes).await?;
        println!(
          "recorded monthly export {} at {}",
          record.id, record.file_path
        );
      }
    }

    Command::Backup { out } => {
      let bytes = backups.full_snapshot().await?;
      fs::write(&out, &bytes)
        .with_context(|| format!("failed to write {}", out.display()))?;
      println!(
        "wrote {} ({} bytes, sha256 {})",
        out.display(),
        bytes.len(),
        sha256_hex(&bytes)
      );
    }

    Command::Restore { .. } => unreachable!("handled before store open"),
  }

  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Copy a local file into the upload tree; returns (stored path, digest).
fn store_upload(
  layout: &StorageLayout,
  parts: &[&str],
  file: &Path,
) -> anyhow::Result<(String, String)> {
  let bytes = fs::read(file)
    .with_context(|| format!("failed to read {}", file.display()))?;
  let stored = layout
    .save_upload(parts, &file_name_of(file), &bytes)
    .context("failed to store upload")?;
  Ok((stored.to_string_lossy().into_owned(), sha256_hex(&bytes)))
}

fn file_name_of(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "file".into())
}

fn type_filter(types: Vec<String>) -> Option<HashSet<String>> {
  if types.is_empty() { None } else { Some(types.into_iter().collect()) }
}

async fn find_worker(
  store: &SqliteStore,
  natural_id: &str,
) -> anyhow::Result<faena_core::worker::Worker> {
  store
    .find_worker(natural_id)
    .await?
    .with_context(|| format!("no worker with national id {natural_id}"))
}

/// Best-effort post-mutation snapshot; never fails the command.
async fn auto_snapshot(backups: &BackupManager, enabled: bool, tag: &str) {
  if !enabled {
    return;
  }
  if let Err(e) = backups.auto_snapshot(tag).await {
    warn!(error = %e, tag, "automatic backup failed");
  }
}
