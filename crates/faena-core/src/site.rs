//! Clients, site contracts, and sites ("faenas").
//!
//! A site is a temporary work location under a client, with its own
//! lifecycle and worker roster. At most one contract governs a site;
//! deleting the contract nulls the reference, it never deletes the site.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A client ("mandante") that sites are executed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
  pub id:   i64,
  pub name: String,
}

/// The commercial document governing one or more sites for a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteContract {
  pub id:         i64,
  pub client_id:  i64,
  pub name:       String,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
  /// Attached contract file, if one was uploaded.
  pub file_path:  Option<String>,
  pub sha256:     Option<String>,
  pub created_at: Option<DateTime<Utc>>,
}

/// Input for [`crate::store::SiteStore::add_contract`].
#[derive(Debug, Clone)]
pub struct NewContract {
  pub client_id:  i64,
  pub name:       String,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
  pub file_path:  Option<String>,
  pub sha256:     Option<String>,
}

/// Lifecycle status of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
  Active,
  Finished,
}

impl std::fmt::Display for SiteStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SiteStatus::Active => write!(f, "ACTIVE"),
      SiteStatus::Finished => write!(f, "FINISHED"),
    }
  }
}

/// A temporary work site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
  pub id:          i64,
  pub client_id:   i64,
  pub contract_id: Option<i64>,
  pub name:        String,
  pub location:    String,
  pub start_date:  NaiveDate,
  pub end_date:    Option<NaiveDate>,
  pub status:      SiteStatus,
}

impl Site {
  /// `YYYY-MM` key of the month the site started in; used to group sites
  /// into monthly export archives.
  pub fn start_year_month(&self) -> String {
    self.start_date.format("%Y-%m").to_string()
  }
}

/// Input for [`crate::store::SiteStore::add_site`].
#[derive(Debug, Clone)]
pub struct NewSite {
  pub client_id:   i64,
  pub contract_id: Option<i64>,
  pub name:        String,
  pub location:    String,
  pub start_date:  NaiveDate,
  pub end_date:    Option<NaiveDate>,
  pub status:      SiteStatus,
}

impl NewSite {
  /// Check the date invariants: an end date may not precede the start
  /// date, and a FINISHED site must carry one.
  pub fn validate_dates(&self) -> Result<()> {
    if let Some(end) = self.end_date {
      if end < self.start_date {
        return Err(Error::InvalidDates(
          "end date cannot precede start date".into(),
        ));
      }
    }
    if self.status == SiteStatus::Finished && self.end_date.is_none() {
      return Err(Error::InvalidDates(
        "a finished site requires an end date".into(),
      ));
    }
    Ok(())
  }
}

/// A file attached to a site with no compliance semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annex {
  pub id:         i64,
  pub site_id:    i64,
  pub name:       String,
  pub file_path:  String,
  pub sha256:     String,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::SiteStore::add_annex`].
#[derive(Debug, Clone)]
pub struct NewAnnex {
  pub site_id:   i64,
  pub name:      String,
  pub file_path: String,
  pub sha256:    String,
}
