use chrono::{DateTime, Utc};

pub type PatientId = i64;

/// Patient summary as shown in the list view
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
  pub id: PatientId,
  pub last_name: String,
  pub first_name: String,
  pub phone: Option<String>,
  pub birth_date: Option<String>,
  pub profession: Option<String>,
  pub insurer: Option<String>,
  /// Missing on rows imported before the column was populated
  pub created_at: Option<DateTime<Utc>>,
}

impl Patient {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
      .trim()
      .to_string()
  }
}

/// A single visit (treatment entry) for a patient
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
  pub id: i64,
  pub patient_id: PatientId,
  pub date: String,
  pub tooth: Option<String>,
  pub procedure: Option<String>,
  pub total: f64,
  pub paid: f64,
  /// As reported by the server, never recomputed from `total - paid`
  pub remaining: f64,
}

/// Money totals over a list of visits
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisitTotals {
  pub total: f64,
  pub paid: f64,
  pub remaining: f64,
  pub unpaid_visits: usize,
}

impl VisitTotals {
  pub fn from_visits(visits: &[Visit]) -> Self {
    visits.iter().fold(Self::default(), |mut acc, visit| {
      acc.total += visit.total;
      acc.paid += visit.paid;
      acc.remaining += visit.remaining;
      if visit.remaining > 0.0 {
        acc.unpaid_visits += 1;
      }
      acc
    })
  }
}
