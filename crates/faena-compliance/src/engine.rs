//! [`ComplianceEngine`] — missing-document queries and the progress table.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use chrono::NaiveDate;
use serde::Serialize;

use faena_core::{
  catalog::{REQUIRED_COMPANY_DOCS, REQUIRED_WORKER_DOCS},
  site::SiteStatus,
  store::SiteStore,
};

use crate::{Error, Result};

// ─── Read models ─────────────────────────────────────────────────────────────

/// Missing required documents for one assigned worker.
///
/// An empty `missing` list means the worker is fully compliant; the worker
/// still gets an entry so manifests can print an explicit `OK` line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerPending {
  pub worker_id: i64,
  /// `"{family_names} {given_names} ({natural_id})"`.
  pub label:     String,
  /// Missing required types, in catalog order.
  pub missing:   Vec<String>,
}

/// One row of the per-site progress table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteProgressRow {
  pub site_id:       i64,
  pub name:          String,
  pub status:        SiteStatus,
  pub start_date:    NaiveDate,
  pub end_date:      Option<NaiveDate>,
  pub client:        String,
  /// Workers assigned to the site, any assignment status.
  pub workers:       i64,
  /// Workers with every required type on file.
  pub workers_ok:    i64,
  /// Percentage of required (worker × type) slots satisfied, one decimal.
  pub coverage_pct:  f64,
  /// Unsatisfied (worker × type) slots.
  pub missing_total: i64,
}

/// Three-level compliance status derived from one progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Semaphore {
  Critical,
  Pending,
  Ok,
}

impl std::fmt::Display for Semaphore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Semaphore::Critical => write!(f, "CRITICAL"),
      Semaphore::Pending => write!(f, "PENDING"),
      Semaphore::Ok => write!(f, "OK"),
    }
  }
}

/// Classify one progress row.
///
/// A site with no assigned workers is always `Critical`, even though its
/// coverage is vacuous; a fully covered site with nothing missing is `Ok`;
/// everything at or above 70% coverage in between is `Pending`.
pub fn semaphore(row: &SiteProgressRow) -> Semaphore {
  if row.workers == 0 || row.coverage_pct < 70.0 {
    Semaphore::Critical
  } else if row.missing_total == 0 && row.coverage_pct >= 100.0 {
    Semaphore::Ok
  } else {
    Semaphore::Pending
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Read-only compliance queries over a [`SiteStore`].
///
/// Cloning is cheap — the store handle is reference-counted.
#[derive(Clone)]
pub struct ComplianceEngine<S> {
  store: Arc<S>,
}

impl<S: SiteStore> ComplianceEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Missing required worker documents for every worker assigned to
  /// `site_id`, ordered by worker family/given names.
  ///
  /// An empty result means no workers are assigned — distinct from every
  /// entry carrying an empty `missing` list, which means full compliance.
  pub async fn missing_worker_documents(
    &self,
    site_id: i64,
  ) -> Result<Vec<WorkerPending>> {
    self.require_site(site_id).await?;

    let workers = self
      .store
      .assigned_workers(site_id)
      .await
      .map_err(Error::store)?;

    let mut out = Vec::with_capacity(workers.len());
    for worker in workers {
      let have: HashSet<String> = self
        .store
        .worker_documents(worker.id)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(|d| d.doc_type)
        .collect();

      let missing = REQUIRED_WORKER_DOCS
        .iter()
        .filter(|t| !have.contains(**t))
        .map(|t| (*t).to_string())
        .collect();

      out.push(WorkerPending {
        worker_id: worker.id,
        label: worker.label(),
        missing,
      });
    }
    Ok(out)
  }

  /// Missing required company documents for `site_id`, in catalog order.
  pub async fn missing_company_documents(
    &self,
    site_id: i64,
  ) -> Result<Vec<String>> {
    self.require_site(site_id).await?;

    let present: HashSet<String> = self
      .store
      .site_company_document_types(site_id)
      .await
      .map_err(Error::store)?
      .into_iter()
      .collect();

    Ok(
      REQUIRED_COMPANY_DOCS
        .iter()
        .filter(|t| !present.contains(**t))
        .map(|t| (*t).to_string())
        .collect(),
    )
  }

  /// One progress row per site, newest site first. Tolerates zero sites
  /// and zero workers; such rows come back with zeroed metrics.
  pub async fn site_progress(&self) -> Result<Vec<SiteProgressRow>> {
    let sites = self.store.list_sites().await.map_err(Error::store)?;
    if sites.is_empty() {
      return Ok(Vec::new());
    }

    let stats =
      self.store.required_presence().await.map_err(Error::store)?;
    let total_required = REQUIRED_WORKER_DOCS.len() as i64;

    // (workers, workers_ok, capped present sum) per site.
    let mut per_site: HashMap<i64, (i64, i64, i64)> = HashMap::new();
    for stat in stats {
      let entry = per_site.entry(stat.site_id).or_insert((0, 0, 0));
      entry.0 += 1;
      if stat.present >= total_required {
        entry.1 += 1;
      }
      entry.2 += stat.present.min(total_required);
    }

    let rows = sites
      .into_iter()
      .map(|overview| {
        let (workers, workers_ok, present_sum) = per_site
          .get(&overview.site.id)
          .copied()
          .unwrap_or((0, 0, 0));

        let slots = workers * total_required;
        let coverage_pct = if workers > 0 {
          round1(present_sum as f64 / slots as f64 * 100.0)
        } else {
          0.0
        };

        SiteProgressRow {
          site_id: overview.site.id,
          name: overview.site.name,
          status: overview.site.status,
          start_date: overview.site.start_date,
          end_date: overview.site.end_date,
          client: overview.client_name,
          workers,
          workers_ok,
          coverage_pct,
          missing_total: slots - present_sum,
        }
      })
      .collect();

    Ok(rows)
  }

  async fn require_site(&self, site_id: i64) -> Result<()> {
    match self.store.get_site(site_id).await.map_err(Error::store)? {
      Some(_) => Ok(()),
      None => Err(Error::SiteNotFound(site_id)),
    }
  }
}

fn round1(x: f64) -> f64 { (x * 10.0).round() / 10.0 }
