//! The companion screen's data actor.
//!
//! `Companion` owns every piece of mutable state: search text, page cursor,
//! visit cache and view state. Triggers issue requests by spawning tasks that
//! call the gateway and post a `DataEvent` back on an unbounded channel. The
//! event loop feeds those into `handle`, which is the only place results are
//! applied. Each response carries the tag it was issued with and is dropped
//! when a newer request of the same kind has been issued since.

pub mod errors;
pub mod pagination;
pub mod search;
pub mod view_state;

#[cfg(test)]
mod tests;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::{CacheLookup, CacheResult, ChildCache, FetchTicket};
use crate::remote::{GatewayError, ParentFilter, Patient, PatientId, RemoteGateway, Visit};

use errors::{classify, RetryAction};
use pagination::{PageKind, PageOutcome, PageTicket, PaginationController};
use search::{DebounceTicket, SearchController};

pub use errors::ErrorNotice;
pub use view_state::{Activity, ListView, ViewState};

/// Tag for a visit fetch: which selection it was issued for and which cache
/// write it may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitTicket {
  generation: u64,
  fetch: FetchTicket,
  bypass: bool,
}

/// Completions posted back to the actor
#[derive(Debug)]
pub enum DataEvent {
  SearchDebounced(DebounceTicket),
  PatientsLoaded {
    ticket: PageTicket,
    filter: ParentFilter,
    result: Result<Vec<Patient>, GatewayError>,
  },
  VisitsLoaded {
    ticket: VisitTicket,
    result: Result<Vec<Visit>, GatewayError>,
  },
}

pub struct Companion {
  gateway: Arc<dyn RemoteGateway>,
  tx: mpsc::UnboundedSender<DataEvent>,
  debounce: Duration,
  search: SearchController,
  pages: PaginationController,
  cache: ChildCache,
  view: ViewState,
  /// Filter the shown patient list was requested with
  active_filter: ParentFilter,
  /// Bumped on every selection change and visit reload
  visit_generation: u64,
}

impl Companion {
  /// Create the actor and the receiving end of its completion channel.
  pub fn new(
    gateway: Arc<dyn RemoteGateway>,
    debounce: Duration,
  ) -> (Self, mpsc::UnboundedReceiver<DataEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let companion = Self {
      gateway,
      tx,
      debounce,
      search: SearchController::new(),
      pages: PaginationController::default(),
      cache: ChildCache::new(),
      view: ViewState::default(),
      active_filter: ParentFilter::default(),
      visit_generation: 0,
    };
    (companion, rx)
  }

  pub fn view(&self) -> &ViewState {
    &self.view
  }

  pub fn search_text(&self) -> &str {
    self.search.text()
  }

  pub fn recent_only(&self) -> bool {
    self.search.recent_only()
  }

  /// Load the first page for the current filter.
  pub fn start(&mut self) {
    let filter = self.search.filter();
    self.reset_patients(filter, false);
  }

  /// Record a keystroke in the search box; the list resets once typing
  /// pauses for the debounce interval.
  pub fn change_search_text(&mut self, text: impl Into<String>) {
    let Some(ticket) = self.search.set_text(text) else {
      return;
    };
    let deadline = tokio::time::Instant::now() + self.debounce;
    let tx = self.tx.clone();
    tokio::spawn(async move {
      tokio::time::sleep_until(deadline).await;
      let _ = tx.send(DataEvent::SearchDebounced(ticket));
    });
  }

  pub fn toggle_recent(&mut self) {
    let filter = self.search.toggle_recent();
    self.reset_patients(filter, false);
  }

  /// Show a patient's visits, from cache when possible.
  pub fn select_patient(&mut self, patient_id: PatientId) {
    let Some(patient) = self
      .view
      .patients()
      .items()
      .iter()
      .find(|p| p.id == patient_id)
      .cloned()
    else {
      warn!(patient_id, "selected patient is not in the list");
      return;
    };
    self.view.select(patient);
    self.load_visits(patient_id, false);
  }

  pub fn clear_selection(&mut self) {
    self.visit_generation += 1;
    self.view.clear_selection();
  }

  /// Reload what is on screen: the selected patient's visits bypassing the
  /// cache, otherwise the patient list.
  pub fn refresh(&mut self) {
    match self.view.selected_id() {
      Some(patient_id) => self.load_visits(patient_id, true),
      None => {
        let filter = self.search.filter();
        self.reset_patients(filter, true);
      }
    }
  }

  /// Append the next page if there is one and nothing is loading.
  pub fn load_more(&mut self) {
    let Some(ticket) = self.pages.load_next() else {
      return;
    };
    self.view.begin_next_page();
    self.spawn_patients(ticket, self.active_filter.clone());
  }

  /// Re-run the operation behind the most relevant visible error.
  /// Re-run whatever produced the topmost error on screen. An error without a
  /// retry action (auth) blocks the ones beneath it.
  pub fn retry(&mut self) {
    let action = [
      self.view.visits().error(),
      self.view.next_page_error(),
      self.view.patients().error(),
    ]
    .into_iter()
    .flatten()
    .next()
    .and_then(|notice| notice.retry.clone());

    match action {
      Some(RetryAction::ResetPatients(filter)) => self.reset_patients(filter, false),
      Some(RetryAction::LoadNextPage) => self.load_more(),
      Some(RetryAction::LoadVisits { patient_id, bypass }) => {
        if self.view.selected_id() == Some(patient_id) {
          self.load_visits(patient_id, bypass);
        }
      }
      None => debug!("nothing to retry"),
    }
  }

  /// Apply a completion from a spawned task.
  pub fn handle(&mut self, event: DataEvent) {
    match event {
      DataEvent::SearchDebounced(ticket) => {
        if let Some(filter) = self.search.fire(ticket) {
          self.reset_patients(filter, false);
        }
      }
      DataEvent::PatientsLoaded {
        ticket,
        filter,
        result,
      } => self.on_patients(ticket, filter, result),
      DataEvent::VisitsLoaded { ticket, result } => self.on_visits(ticket, result),
    }
  }

  fn reset_patients(&mut self, filter: ParentFilter, refreshing: bool) {
    let ticket = self.pages.reset();
    info!(text = %filter.text, recent_only = filter.recent_only, seq = ticket.seq, "loading patients");
    self.active_filter = filter.clone();
    self.view.begin_patient_reset(refreshing);
    self.spawn_patients(ticket, filter);
  }

  fn spawn_patients(&self, ticket: PageTicket, filter: ParentFilter) {
    let gateway = Arc::clone(&self.gateway);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = gateway.fetch_parents(&filter, ticket.page).await;
      let _ = tx.send(DataEvent::PatientsLoaded {
        ticket,
        filter,
        result,
      });
    });
  }

  fn on_patients(
    &mut self,
    ticket: PageTicket,
    filter: ParentFilter,
    result: Result<Vec<Patient>, GatewayError>,
  ) {
    match self.pages.complete(ticket, result) {
      PageOutcome::Stale => {
        debug!(seq = ticket.seq, page = ticket.page, "discarding stale patient page");
      }
      PageOutcome::Replace(patients) => {
        debug!(count = patients.len(), "patient list replaced");
        self.view.replace_patients(patients, self.pages.has_more());
      }
      PageOutcome::Append(patients) => {
        debug!(count = patients.len(), page = ticket.page, "patient page appended");
        self.view.append_patients(patients, self.pages.has_more());
      }
      PageOutcome::Failed {
        kind: PageKind::First,
        error,
      } => {
        warn!(%error, "patient list failed to load");
        self
          .view
          .fail_patient_reset(classify(&error, RetryAction::ResetPatients(filter)));
      }
      PageOutcome::Failed {
        kind: PageKind::Next,
        error,
      } => {
        warn!(%error, page = ticket.page, "next patient page failed to load");
        self
          .view
          .fail_next_page(classify(&error, RetryAction::LoadNextPage));
      }
    }
  }

  fn load_visits(&mut self, patient_id: PatientId, bypass: bool) {
    self.visit_generation += 1;
    match self.cache.lookup(patient_id, bypass) {
      CacheLookup::Hit(result) => self.view.show_visits(result),
      CacheLookup::Miss(fetch) => {
        self.view.begin_visits(bypass);
        let ticket = VisitTicket {
          generation: self.visit_generation,
          fetch,
          bypass,
        };
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
          let result = gateway.fetch_children(patient_id).await;
          let _ = tx.send(DataEvent::VisitsLoaded { ticket, result });
        });
      }
    }
  }

  fn on_visits(&mut self, ticket: VisitTicket, result: Result<Vec<Visit>, GatewayError>) {
    let patient_id = ticket.fetch.patient_id;
    let current = ticket.generation == self.visit_generation;

    match result {
      Ok(visits) => {
        // A superseded fetch still warms the cache
        self.cache.store(ticket.fetch, visits.clone());
        if !current {
          debug!(patient_id, "discarding stale visit list");
          return;
        }
        self
          .view
          .show_visits(CacheResult::from_network(visits, Utc::now()));
      }
      Err(error) => {
        if !current {
          debug!(patient_id, %error, "discarding stale visit failure");
          return;
        }
        warn!(patient_id, %error, "visits failed to load");
        self.view.fail_visits(classify(
          &error,
          RetryAction::LoadVisits {
            patient_id,
            bypass: ticket.bypass,
          },
        ));
      }
    }
  }
}
