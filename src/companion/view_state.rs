//! What the screen is allowed to see.
//!
//! `ViewState` is read-only outside the `companion` module: only the
//! actor's completion handling moves it between states.

use chrono::{DateTime, Utc};

use crate::cache::{CacheResult, CacheSource};
use crate::remote::{Patient, PatientId, Visit, VisitTotals};

use super::errors::ErrorNotice;

/// Request activity of a single list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activity {
  #[default]
  Idle,
  /// First load, or a reset after a filter change
  Loading,
  /// Appending the next page
  LoadingMore,
  /// User-initiated reload that keeps what is shown
  Refreshing,
}

/// A materialized list with its activity and error axis
#[derive(Debug, Clone)]
pub struct ListView<T> {
  items: Vec<T>,
  activity: Activity,
  error: Option<ErrorNotice>,
}

impl<T> Default for ListView<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      activity: Activity::Idle,
      error: None,
    }
  }
}

impl<T> ListView<T> {
  pub fn items(&self) -> &[T] {
    &self.items
  }

  pub fn activity(&self) -> Activity {
    self.activity
  }

  pub fn error(&self) -> Option<&ErrorNotice> {
    self.error.as_ref()
  }

  pub fn is_busy(&self) -> bool {
    self.activity != Activity::Idle
  }
}

/// Everything the presentation layer reads
#[derive(Debug, Clone, Default)]
pub struct ViewState {
  patients: ListView<Patient>,
  /// The latest first-page query has completed successfully
  loaded: bool,
  has_more: bool,
  next_page_error: Option<ErrorNotice>,
  selected: Option<Patient>,
  visits: ListView<Visit>,
  visits_source: Option<(CacheSource, DateTime<Utc>)>,
}

impl ViewState {
  pub fn patients(&self) -> &ListView<Patient> {
    &self.patients
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  /// Inline error from the last failed next-page load
  pub fn next_page_error(&self) -> Option<&ErrorNotice> {
    self.next_page_error.as_ref()
  }

  /// A completed query that matched nothing, as opposed to a failure.
  pub fn is_empty_result(&self) -> bool {
    self.loaded && self.patients.items.is_empty() && self.patients.error.is_none()
  }

  pub fn selected(&self) -> Option<&Patient> {
    self.selected.as_ref()
  }

  pub fn selected_id(&self) -> Option<PatientId> {
    self.selected.as_ref().map(|p| p.id)
  }

  pub fn visits(&self) -> &ListView<Visit> {
    &self.visits
  }

  /// Where the shown visits came from and when they were fetched
  pub fn visits_source(&self) -> Option<(CacheSource, DateTime<Utc>)> {
    self.visits_source
  }

  pub fn visit_totals(&self) -> VisitTotals {
    VisitTotals::from_visits(&self.visits.items)
  }

  // Transitions, driven by the companion

  pub(super) fn begin_patient_reset(&mut self, refreshing: bool) {
    self.patients.activity = if refreshing {
      Activity::Refreshing
    } else {
      Activity::Loading
    };
    // the previous result no longer answers the query in flight
    self.loaded = false;
    self.patients.error = None;
    self.next_page_error = None;
  }

  pub(super) fn begin_next_page(&mut self) {
    self.patients.activity = Activity::LoadingMore;
    self.next_page_error = None;
  }

  pub(super) fn replace_patients(&mut self, patients: Vec<Patient>, has_more: bool) {
    self.patients.items = patients;
    self.patients.activity = Activity::Idle;
    self.patients.error = None;
    self.loaded = true;
    self.has_more = has_more;
  }

  pub(super) fn append_patients(&mut self, patients: Vec<Patient>, has_more: bool) {
    self.patients.items.extend(patients);
    self.patients.activity = Activity::Idle;
    self.has_more = has_more;
  }

  pub(super) fn fail_patient_reset(&mut self, notice: ErrorNotice) {
    self.patients.items.clear();
    self.patients.activity = Activity::Idle;
    self.patients.error = Some(notice);
    self.loaded = false;
    self.has_more = false;
  }

  pub(super) fn fail_next_page(&mut self, notice: ErrorNotice) {
    self.patients.activity = Activity::Idle;
    self.next_page_error = Some(notice);
  }

  /// Switch the visit panel to `patient`, dropping whatever was shown.
  pub(super) fn select(&mut self, patient: Patient) {
    self.selected = Some(patient);
    self.visits = ListView::default();
    self.visits_source = None;
  }

  pub(super) fn clear_selection(&mut self) {
    self.selected = None;
    self.visits = ListView::default();
    self.visits_source = None;
  }

  pub(super) fn begin_visits(&mut self, refreshing: bool) {
    self.visits.activity = if refreshing {
      Activity::Refreshing
    } else {
      Activity::Loading
    };
    self.visits.error = None;
  }

  pub(super) fn show_visits(&mut self, result: CacheResult<Vec<Visit>>) {
    self.visits.items = result.data;
    self.visits.activity = Activity::Idle;
    self.visits.error = None;
    self.visits_source = Some((result.source, result.cached_at));
  }

  /// Surface a visit error. Visits already on screen stay.
  pub(super) fn fail_visits(&mut self, notice: ErrorNotice) {
    self.visits.activity = Activity::Idle;
    self.visits.error = Some(notice);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::companion::errors::{classify, RetryAction};
  use crate::remote::memory::fixtures::{now, patient, roster, visit};
  use crate::remote::GatewayError;

  fn network_notice() -> ErrorNotice {
    classify(&GatewayError::Timeout, RetryAction::LoadNextPage)
  }

  #[test]
  fn test_empty_result_is_distinct_from_failure() {
    let mut view = ViewState::default();
    assert!(!view.is_empty_result());

    view.begin_patient_reset(false);
    view.replace_patients(vec![], false);
    assert!(view.is_empty_result());

    view.begin_patient_reset(false);
    view.fail_patient_reset(network_notice());
    assert!(!view.is_empty_result());
    assert!(view.patients().error().is_some());
  }

  #[test]
  fn test_empty_result_clears_when_a_new_query_starts() {
    let mut view = ViewState::default();
    view.begin_patient_reset(false);
    view.replace_patients(vec![], false);
    assert!(view.is_empty_result());

    view.begin_patient_reset(false);
    assert!(!view.is_empty_result());
    assert_eq!(view.patients().activity(), Activity::Loading);

    view.replace_patients(vec![], false);
    view.begin_patient_reset(true);
    assert!(!view.is_empty_result());
  }

  #[test]
  fn test_failed_next_page_keeps_items() {
    let mut view = ViewState::default();
    view.replace_patients(roster(20), true);
    view.begin_next_page();
    assert_eq!(view.patients().activity(), Activity::LoadingMore);

    view.fail_next_page(network_notice());
    assert_eq!(view.patients().items().len(), 20);
    assert!(view.has_more());
    assert!(view.next_page_error().is_some());
    assert!(view.patients().error().is_none());
  }

  #[test]
  fn test_selection_clears_visits_immediately() {
    let mut view = ViewState::default();
    view.select(patient(1, "Amrani", "A", 1));
    view.show_visits(CacheResult::from_network(vec![visit(1, 1, "2026-10-01")], now()));
    view.fail_visits(network_notice());

    view.select(patient(2, "Bennani", "B", 1));
    assert_eq!(view.selected_id(), Some(2));
    assert!(view.visits().items().is_empty());
    assert!(view.visits().error().is_none());
    assert_eq!(view.visits_source(), None);
  }

  #[test]
  fn test_failed_refresh_keeps_shown_visits() {
    let mut view = ViewState::default();
    view.select(patient(1, "Amrani", "A", 1));
    view.show_visits(CacheResult::from_cache(vec![visit(1, 1, "2026-10-01")], now()));

    view.begin_visits(true);
    assert_eq!(view.visits().activity(), Activity::Refreshing);
    view.fail_visits(network_notice());
    assert_eq!(view.visits().items().len(), 1);
    assert!(view.visits().error().is_some());
    assert_eq!(view.visit_totals().total, 200.0);
  }
}
