//! Page cursor and load state for the patient list.
//!
//! Every request is issued as a `PageTicket`. Only the ticket currently in
//! flight may complete; anything else is a stale response and is dropped.
//! This is how a reset supersedes a slower next-page fetch without any real
//! cancellation.

use crate::remote::{GatewayError, Patient, PAGE_SIZE};

/// Which kind of patient-list request is in flight, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
  #[default]
  Idle,
  LoadingFirstPage,
  LoadingNextPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
  First,
  Next,
}

/// Tag attached to one patient-list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
  pub seq: u64,
  pub page: usize,
  pub kind: PageKind,
}

/// What the caller should do with a completed request
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
  /// Replace the list (first page)
  Replace(Vec<Patient>),
  /// Append to the list (next page)
  Append(Vec<Patient>),
  /// The request failed; `kind` says which list behavior applies
  Failed { kind: PageKind, error: GatewayError },
  /// Superseded by a later request; ignore
  Stale,
}

#[derive(Debug)]
pub struct PaginationController {
  page_size: usize,
  /// Page the next `load_next` will request
  page: usize,
  has_more: bool,
  seq: u64,
  in_flight: Option<PageTicket>,
}

impl Default for PaginationController {
  fn default() -> Self {
    Self::new(PAGE_SIZE)
  }
}

impl PaginationController {
  pub fn new(page_size: usize) -> Self {
    Self {
      page_size,
      page: 0,
      has_more: false,
      seq: 0,
      in_flight: None,
    }
  }

  pub fn state(&self) -> LoadState {
    match self.in_flight.map(|t| t.kind) {
      None => LoadState::Idle,
      Some(PageKind::First) => LoadState::LoadingFirstPage,
      Some(PageKind::Next) => LoadState::LoadingNextPage,
    }
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub fn page(&self) -> usize {
    self.page
  }

  /// Start over from page 0. Always issues a request and supersedes whatever
  /// is in flight.
  pub fn reset(&mut self) -> PageTicket {
    self.page = 0;
    self.issue(PageKind::First, 0)
  }

  /// Request the next page, or None if there is nothing more to load or a
  /// request is already in flight.
  pub fn load_next(&mut self) -> Option<PageTicket> {
    if !self.has_more || self.in_flight.is_some() {
      return None;
    }
    Some(self.issue(PageKind::Next, self.page))
  }

  fn issue(&mut self, kind: PageKind, page: usize) -> PageTicket {
    self.seq += 1;
    let ticket = PageTicket {
      seq: self.seq,
      page,
      kind,
    };
    self.in_flight = Some(ticket);
    ticket
  }

  /// Apply the result of a request.
  pub fn complete(
    &mut self,
    ticket: PageTicket,
    result: Result<Vec<Patient>, GatewayError>,
  ) -> PageOutcome {
    if self.in_flight != Some(ticket) {
      return PageOutcome::Stale;
    }
    self.in_flight = None;

    match result {
      Ok(batch) => {
        // Full page means "probably more"; an empty page is final either way
        self.has_more = !batch.is_empty() && batch.len() == self.page_size;
        self.page = if self.has_more {
          ticket.page + 1
        } else {
          ticket.page
        };
        match ticket.kind {
          PageKind::First => PageOutcome::Replace(batch),
          PageKind::Next => PageOutcome::Append(batch),
        }
      }
      Err(error) => {
        if ticket.kind == PageKind::First {
          self.page = 0;
          self.has_more = false;
        }
        PageOutcome::Failed {
          kind: ticket.kind,
          error,
        }
      }
    }
  }
}
