//! Filter state and its encoding as PostgREST query parameters.
//!
//! The same `ParentFilter` drives both the remote query string and the
//! in-memory gateway, so `matches` documents exactly what the server is asked
//! to do. Recency is compared by calendar day (UTC) because `created_at` is a
//! date column on older tables and a timestamp on newer ones.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::types::{Patient, PatientId};

/// Number of patients requested per page
pub const PAGE_SIZE: usize = 20;

/// "Recent only" keeps patients created within this many days (inclusive)
pub const RECENT_WINDOW_DAYS: i64 = 30;

pub const PATIENT_TABLE: &str = "patients";
pub const VISIT_TABLE: &str = "visits";

/// Column projection for the patient list
pub const PATIENT_COLUMNS: &str =
  "id,nom,prenom,telephone,date_naissance,profession,assurance,created_at";

/// Column projection for a patient's visits
pub const VISIT_COLUMNS: &str = "id,date,dent,acte,prix,paye,reste,patient_id";

/// Columns matched by the free-text search
const SEARCH_COLUMNS: [&str; 3] = ["nom", "prenom", "telephone"];

/// Filter applied to the patient list
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParentFilter {
  pub text: String,
  pub recent_only: bool,
}

impl ParentFilter {
  pub fn new(text: impl Into<String>, recent_only: bool) -> Self {
    Self {
      text: text.into(),
      recent_only,
    }
  }

  /// The trimmed search term, or None when the text is blank.
  pub fn search_term(&self) -> Option<&str> {
    let term = self.text.trim();
    (!term.is_empty()).then_some(term)
  }

  /// First calendar day (UTC) still considered recent, if the toggle is set.
  pub fn recent_cutoff(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
    self
      .recent_only
      .then(|| (now - Duration::days(RECENT_WINDOW_DAYS)).date_naive())
  }

  /// Whether a patient satisfies this filter at time `now`.
  ///
  /// Rows without a creation time are never recent.
  pub fn matches(&self, patient: &Patient, now: DateTime<Utc>) -> bool {
    if let Some(cutoff) = self.recent_cutoff(now) {
      match patient.created_at {
        Some(created) if created.date_naive() >= cutoff => {}
        _ => return false,
      }
    }

    match self.search_term() {
      None => true,
      Some(term) => {
        let term = term.to_lowercase();
        [
          Some(patient.last_name.as_str()),
          Some(patient.first_name.as_str()),
          patient.phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
      }
    }
  }
}

/// Inclusive row range `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
  pub from: usize,
  pub to: usize,
}

impl RowRange {
  pub fn for_page(page: usize, page_size: usize) -> Self {
    let from = page * page_size;
    Self {
      from,
      to: from + page_size.saturating_sub(1),
    }
  }

  pub fn len(&self) -> usize {
    self.to + 1 - self.from
  }
}

/// Query parameters for one page of the patient list.
pub fn patient_query(filter: &ParentFilter, page: usize, now: DateTime<Utc>) -> Vec<(String, String)> {
  let range = RowRange::for_page(page, PAGE_SIZE);

  let mut params = vec![
    ("select".to_string(), PATIENT_COLUMNS.to_string()),
    ("order".to_string(), "created_at.desc.nullslast".to_string()),
  ];

  if let Some(term) = filter.search_term() {
    let pattern = ilike_pattern(term);
    let clauses: Vec<String> = SEARCH_COLUMNS
      .iter()
      .map(|column| format!("{}.ilike.{}", column, pattern))
      .collect();
    params.push(("or".to_string(), format!("({})", clauses.join(","))));
  }

  if let Some(cutoff) = filter.recent_cutoff(now) {
    params.push((
      "created_at".to_string(),
      format!("gte.{}", cutoff.format("%Y-%m-%d")),
    ));
  }

  params.push(("offset".to_string(), range.from.to_string()));
  params.push(("limit".to_string(), range.len().to_string()));
  params
}

/// Query parameters for all visits of a patient, newest first.
pub fn visit_query(patient_id: PatientId) -> Vec<(String, String)> {
  vec![
    ("select".to_string(), VISIT_COLUMNS.to_string()),
    ("patient_id".to_string(), format!("eq.{}", patient_id)),
    ("order".to_string(), "date.desc".to_string()),
  ]
}

/// Quote a substring pattern so reserved characters (`,`, `(`, `)`) in the
/// search term stay inside the value.
fn ilike_pattern(term: &str) -> String {
  let escaped = term.replace('\\', "\\\\").replace('"', "\\\"");
  format!("\"*{}*\"", escaped)
}
