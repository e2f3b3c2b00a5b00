//! Fixed document-type catalogs used by the compliance arithmetic.
//!
//! Document types are stored as open strings; coverage math only ever
//! consults these catalogs. Free-form types (e.g. `OTROS`) may exist in the
//! store without affecting any metric. Catalog order is the display and
//! manifest order.

/// Worker document types every assigned worker must have on file.
pub const REQUIRED_WORKER_DOCS: &[&str] = &[
  "REGISTRO_EPP",
  "ENTREGA_RIOHS",
  "IRL",
  "CONTRATO_TRABAJO",
  "ANEXO_CONTRATO",
  "LIQUIDACIONES",
  "FINIQUITO",
];

/// Company document types required per site.
pub const REQUIRED_COMPANY_DOCS: &[&str] =
  &["CERTIFICADO_CUMPLIMIENTO_LABORAL", "CERTIFICADO_ACCIDENTABILIDAD"];

/// Superset of company document types offered as upload hints. Never used
/// for coverage arithmetic.
pub const SUGGESTED_COMPANY_DOCS: &[&str] = &[
  "CERTIFICADO_CUMPLIMIENTO_LABORAL",
  "CERTIFICADO_ACCIDENTABILIDAD",
  "OTROS",
];

/// Number of required worker document types; one "slot" per (worker, type)
/// pair in coverage percentages.
pub fn required_worker_doc_count() -> usize { REQUIRED_WORKER_DOCS.len() }
