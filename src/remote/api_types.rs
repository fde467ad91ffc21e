//! Serde-deserializable types matching the Supabase REST and auth responses.
//!
//! These types are separate from domain types so column names and nullability
//! quirks of the backing tables stay out of the rest of the crate.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::types::{Patient, Visit};

// ============================================================================
// Table rows
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiPatient {
  pub id: i64,
  pub nom: Option<String>,
  pub prenom: Option<String>,
  pub telephone: Option<String>,
  pub date_naissance: Option<String>,
  pub profession: Option<String>,
  pub assurance: Option<String>,
  #[serde(default, deserialize_with = "deserialize_timestamp")]
  pub created_at: Option<DateTime<Utc>>,
}

impl ApiPatient {
  pub fn into_patient(self) -> Patient {
    Patient {
      id: self.id,
      last_name: self.nom.unwrap_or_default(),
      first_name: self.prenom.unwrap_or_default(),
      phone: non_blank(self.telephone),
      birth_date: non_blank(self.date_naissance),
      profession: non_blank(self.profession),
      insurer: non_blank(self.assurance),
      created_at: self.created_at,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiVisit {
  pub id: i64,
  pub patient_id: i64,
  #[serde(default)]
  pub date: Option<String>,
  pub dent: Option<String>,
  pub acte: Option<String>,
  pub prix: Option<f64>,
  pub paye: Option<f64>,
  pub reste: Option<f64>,
}

impl ApiVisit {
  pub fn into_visit(self) -> Visit {
    Visit {
      id: self.id,
      patient_id: self.patient_id,
      date: self.date.unwrap_or_default(),
      tooth: non_blank(self.dent),
      procedure: non_blank(self.acte),
      total: self.prix.unwrap_or(0.0),
      paid: self.paye.unwrap_or(0.0),
      remaining: self.reste.unwrap_or(0.0),
    }
  }
}

// ============================================================================
// Auth endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTokenResponse {
  pub access_token: String,
  /// Lifetime in seconds
  pub expires_in: Option<i64>,
  pub user: Option<ApiUser>,
}

// ============================================================================
// Error bodies
// ============================================================================

/// Error body returned by PostgREST (`message`) or the auth server
/// (`msg` / `error_description`).
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  pub message: Option<String>,
  pub msg: Option<String>,
  pub error_description: Option<String>,
}

impl ApiErrorBody {
  /// Best human-readable message from a raw error body.
  pub fn message_from(body: &str) -> String {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
      .message
      .or(parsed.msg)
      .or(parsed.error_description)
      .unwrap_or_else(|| body.trim().to_string())
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

/// Parse a timestamp that may be RFC 3339, a naive timestamp or a plain date.
/// Naive values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
      return Some(dt.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}

/// Null, missing and unreadable timestamps all become `None`; one odd row
/// must not fail the whole page.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(raw) = Option::<String>::deserialize(deserializer)? else {
    return Ok(None);
  };
  let parsed = parse_timestamp(&raw);
  if parsed.is_none() {
    warn!(value = %raw, "ignoring unreadable timestamp");
  }
  Ok(parsed)
}
