//! In-memory gateway over a fixed roster.
//!
//! Applies the same filter, ordering and row-range rules as the remote query,
//! records every call it serves, and can be told to delay or fail calls.
//! Backs `--demo` mode and the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::error::GatewayError;
use super::gateway::RemoteGateway;
use super::query::{ParentFilter, RowRange, PAGE_SIZE};
use super::types::{Patient, PatientId, Visit};

/// A call served by the in-memory gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
  Parents { filter: ParentFilter, page: usize },
  Children { patient_id: PatientId },
}

#[derive(Default)]
struct Controls {
  calls: Vec<GatewayCall>,
  parent_failures: VecDeque<GatewayError>,
  child_failures: VecDeque<GatewayError>,
  parent_delays: VecDeque<std::time::Duration>,
  child_delays: HashMap<PatientId, std::time::Duration>,
}

pub struct InMemoryGateway {
  patients: Vec<Patient>,
  visits: Vec<Visit>,
  now: DateTime<Utc>,
  controls: Mutex<Controls>,
}

impl InMemoryGateway {
  /// Gateway over the given rows, evaluating recency against `now`.
  pub fn new(patients: Vec<Patient>, visits: Vec<Visit>, now: DateTime<Utc>) -> Self {
    Self {
      patients,
      visits,
      now,
      controls: Mutex::new(Controls::default()),
    }
  }

  /// A small clinic roster for demo mode.
  pub fn demo(now: DateTime<Utc>) -> Self {
    const NAMES: [(&str, &str); 12] = [
      ("Alaoui", "Sara"),
      ("Benali", "Omar"),
      ("Chraibi", "Nadia"),
      ("Dahbi", "Youssef"),
      ("El Idrissi", "Khadija"),
      ("Fassi", "Mehdi"),
      ("Ghazali", "Imane"),
      ("Haddad", "Karim"),
      ("Idrissi", "Salma"),
      ("Jabri", "Hamza"),
      ("Kettani", "Laila"),
      ("Lahlou", "Anas"),
    ];
    const ACTS: [(&str, f64); 5] = [
      ("Consultation", 200.0),
      ("Détartrage", 400.0),
      ("Composite", 600.0),
      ("Dévitalisation", 1500.0),
      ("Extraction", 350.0),
    ];

    let mut patients = Vec::new();
    let mut visits = Vec::new();
    for i in 0..57i64 {
      let (last, first) = NAMES[(i as usize) % NAMES.len()];
      patients.push(Patient {
        id: i + 1,
        last_name: last.to_string(),
        first_name: first.to_string(),
        phone: Some(format!("06{:08}", 12_340_000 + i * 7)),
        birth_date: Some(format!("19{}-0{}-1{}", 60 + i % 40, 1 + i % 9, i % 10)),
        profession: None,
        insurer: (i % 3 == 0).then(|| "CNSS".to_string()),
        created_at: (i % 19 != 18).then(|| now - Duration::days(i * 3)),
      });

      for v in 0..(i % 4) {
        let (act, price) = ACTS[((i + v) as usize) % ACTS.len()];
        let paid = if v % 2 == 0 { price } else { price / 2.0 };
        visits.push(Visit {
          id: i * 10 + v,
          patient_id: i + 1,
          date: (now - Duration::days(i * 3 - v * 2 - 1).max(Duration::zero()))
            .format("%Y-%m-%d")
            .to_string(),
          tooth: Some(format!("{}", 11 + (i + v) % 37)),
          procedure: Some(act.to_string()),
          total: price,
          paid,
          remaining: price - paid,
        });
      }
    }

    Self::new(patients, visits, now)
  }

  /// Every call served so far, in arrival order.
  pub fn calls(&self) -> Vec<GatewayCall> {
    self.controls().calls.clone()
  }

  pub fn parent_calls(&self) -> Vec<(ParentFilter, usize)> {
    self
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        GatewayCall::Parents { filter, page } => Some((filter, page)),
        GatewayCall::Children { .. } => None,
      })
      .collect()
  }

  pub fn child_calls(&self) -> Vec<PatientId> {
    self
      .calls()
      .into_iter()
      .filter_map(|call| match call {
        GatewayCall::Children { patient_id } => Some(patient_id),
        GatewayCall::Parents { .. } => None,
      })
      .collect()
  }

  fn controls(&self) -> MutexGuard<'_, Controls> {
    match self.controls.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  fn select_patients(&self, filter: &ParentFilter, page: usize) -> Vec<Patient> {
    let mut matching: Vec<&Patient> = self
      .patients
      .iter()
      .filter(|p| filter.matches(p, self.now))
      .collect();
    // newest first; `None < Some` puts undated rows last, as nullslast does
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let range = RowRange::for_page(page, PAGE_SIZE);
    matching
      .into_iter()
      .skip(range.from)
      .take(range.len())
      .cloned()
      .collect()
  }

  fn select_visits(&self, patient_id: PatientId) -> Vec<Visit> {
    let mut visits: Vec<Visit> = self
      .visits
      .iter()
      .filter(|v| v.patient_id == patient_id)
      .cloned()
      .collect();
    visits.sort_by(|a, b| b.date.cmp(&a.date));
    visits
  }
}

#[cfg(test)]
impl InMemoryGateway {
  /// Fail the next patient-list call with `error`.
  pub fn fail_next_parents(&self, error: GatewayError) {
    self.controls().parent_failures.push_back(error);
  }

  /// Fail the next visit call with `error`.
  pub fn fail_next_children(&self, error: GatewayError) {
    self.controls().child_failures.push_back(error);
  }

  /// Delay the next patient-list call by `delay`.
  pub fn delay_next_parents(&self, delay: std::time::Duration) {
    self.controls().parent_delays.push_back(delay);
  }

  /// Delay every visit call for `patient_id` by `delay`.
  pub fn delay_children(&self, patient_id: PatientId, delay: std::time::Duration) {
    self.controls().child_delays.insert(patient_id, delay);
  }
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
  async fn fetch_parents(
    &self,
    filter: &ParentFilter,
    page: usize,
  ) -> Result<Vec<Patient>, GatewayError> {
    let (delay, failure) = {
      let mut controls = self.controls();
      controls.calls.push(GatewayCall::Parents {
        filter: filter.clone(),
        page,
      });
      (controls.parent_delays.pop_front(), controls.parent_failures.pop_front())
    };

    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    match failure {
      Some(error) => Err(error),
      None => Ok(self.select_patients(filter, page)),
    }
  }

  async fn fetch_children(&self, patient_id: PatientId) -> Result<Vec<Visit>, GatewayError> {
    let (delay, failure) = {
      let mut controls = self.controls();
      controls.calls.push(GatewayCall::Children { patient_id });
      (
        controls.child_delays.get(&patient_id).copied(),
        controls.child_failures.pop_front(),
      )
    };

    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    match failure {
      Some(error) => Err(error),
      None => Ok(self.select_visits(patient_id)),
    }
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;
  use chrono::TimeZone;

  pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
  }

  pub fn patient(id: PatientId, last: &str, first: &str, days_ago: i64) -> Patient {
    Patient {
      id,
      last_name: last.to_string(),
      first_name: first.to_string(),
      phone: None,
      birth_date: None,
      profession: None,
      insurer: None,
      created_at: Some(now() - Duration::days(days_ago)),
    }
  }

  pub fn visit(id: i64, patient_id: PatientId, date: &str) -> Visit {
    Visit {
      id,
      patient_id,
      date: date.to_string(),
      tooth: None,
      procedure: Some("Consultation".to_string()),
      total: 200.0,
      paid: 200.0,
      remaining: 0.0,
    }
  }

  /// `count` patients, one per hour, newest first by id.
  pub fn roster(count: usize) -> Vec<Patient> {
    (0..count as i64)
      .map(|i| Patient {
        created_at: Some(now() - Duration::hours(i)),
        ..patient(i + 1, &format!("Patient{}", i + 1), "Test", 0)
      })
      .collect()
  }
}
