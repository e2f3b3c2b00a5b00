//! Plain-text manifests embedded in every export archive.
//!
//! Wording is part of the export contract: auditors diff these files
//! between archives, so lines stay byte-stable for identical inputs.

use faena_compliance::WorkerPending;
use faena_core::store::{SiteHeader, SiteOverview};

/// `99_Index_Pendientes.txt` — header plus the full pending breakdown.
/// Generated even when every list is empty.
pub fn pending_index(
  header: &SiteHeader,
  worker_pending: &[WorkerPending],
  company_missing: &[String],
) -> String {
  let site = &header.site;
  let mut lines = Vec::new();

  lines.push(format!("MANDANTE: {}", header.client_name));
  lines.push(format!("FAENA: {}", site.name));
  lines.push(format!("ESTADO: {}", site.status));
  lines.push(format!(
    "INICIO: {} | TERMINO: {}",
    site.start_date.format("%Y-%m-%d"),
    site
      .end_date
      .map(|d| d.format("%Y-%m-%d").to_string())
      .unwrap_or_else(|| "-".into()),
  ));
  lines.push(format!(
    "UBICACION: {}",
    if site.location.is_empty() { "-" } else { &site.location }
  ));
  lines.push(format!(
    "CONTRATO_FAENA: {}",
    header
      .contract_name
      .as_deref()
      .unwrap_or("(sin contrato cargado)")
  ));

  lines.push(String::new());
  lines.push("PENDIENTES DOCUMENTOS OBLIGATORIOS POR TRABAJADOR:".into());
  if worker_pending.is_empty() {
    lines.push("- (sin trabajadores asignados)".into());
  } else {
    for entry in worker_pending {
      if entry.missing.is_empty() {
        lines.push(format!("* {}: OK", entry.label));
      } else {
        lines.push(format!(
          "* {}: faltan {}",
          entry.label,
          entry.missing.join(", ")
        ));
      }
    }
  }

  lines.push(String::new());
  lines.push("PENDIENTES DOCUMENTOS EMPRESA (POR FAENA):".into());
  if company_missing.is_empty() {
    lines.push("* OK".into());
  } else {
    lines.push(format!("* faltan: {}", company_missing.join(", ")));
  }

  lines.join("\n")
}

/// `00_Index_Mes.txt` — count plus one line per included site.
pub fn month_index(year_month: &str, sites: &[SiteOverview]) -> String {
  let mut lines = Vec::new();
  lines.push(format!("EXPORT MENSUAL: {year_month}"));
  lines.push(format!("FAENAS INCLUIDAS: {}", sites.len()));
  lines.push(String::new());
  for overview in sites {
    let site = &overview.site;
    lines.push(format!(
      "- {}: {} / {} ({}) inicio {}",
      site.id,
      overview.client_name,
      site.name,
      site.status,
      site.start_date.format("%Y-%m-%d"),
    ));
  }
  lines.join("\n")
}
